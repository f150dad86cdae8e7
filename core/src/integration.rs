//! Integration tests for the acoustics runtime
//!
//! End-to-end scenarios over the fake engine: setup, the running loop with
//! impulse-response injection alongside it, and teardown ordering.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec3;
    use nether_acoustics_shared::{DebugLevel, PlVector, ResultCode};

    use crate::builder::{SceneBuilder, SetupStage};
    use crate::config::AcousticsConfig;
    use crate::context::VoxelGridDescriptor;
    use crate::middleware::{
        ChannelGroupId, EffectType, ImpulseResponse, ImpulseResponseInjector, InjectionOutcome,
    };
    use crate::simulation::{SimulationLoop, SimulationSettings, StaticPosition, StopReason};
    use crate::test_utils::{
        Call, FakeConvolutionHost, FakeEngine, ScriptedEmitter, unreadable_wall, wall,
    };

    // ============================================================================
    // Setup Scenarios
    // ============================================================================

    #[test]
    fn test_failed_system_never_touches_scene() {
        let engine = FakeEngine::new();
        engine.fail_next(Call::SystemCreate, ResultCode::Err);
        let builder = SceneBuilder::new(VoxelGridDescriptor::new(Vec3::splat(8.0), 0.5).unwrap());

        {
            let (_context, report) = builder.build(engine.clone(), &[wall("floor", Vec3::ZERO)]);
            assert_eq!(report.completed, vec![SetupStage::DebugCallback]);
        }

        assert_eq!(engine.count(Call::SystemCreateScene), 0);
        assert_eq!(engine.count(Call::SceneRelease), 0);
        assert_eq!(engine.count(Call::SystemRelease), 0);
        assert_eq!(engine.invalid_releases(), 0);
    }

    #[test]
    fn test_three_objects_one_unreadable() {
        let engine = FakeEngine::new();
        let builder = SceneBuilder::new(VoxelGridDescriptor::new(Vec3::splat(8.0), 0.5).unwrap());
        let objects = [
            wall("left", Vec3::NEG_X * 2.0),
            unreadable_wall("lightmapped"),
            wall("right", Vec3::X * 2.0),
        ];

        let (context, report) = builder.build(engine.clone(), &objects);

        assert_eq!(engine.count(Call::SceneAddMesh), 2);
        assert_eq!(report.ingest.skipped.len(), 1);
        assert_eq!(context.meshes().len(), 2);
        assert!(context.is_ready());
    }

    #[test]
    fn test_native_log_routing_lifetime() {
        let engine = FakeEngine::new();
        let builder = SceneBuilder::new(VoxelGridDescriptor::new(Vec3::splat(4.0), 1.0).unwrap());

        let (mut context, _report) = builder.build(engine.clone(), &[wall("w", Vec3::ZERO)]);
        assert_eq!(engine.emit_debug("filled 64 voxels", DebugLevel::Log), Some(ResultCode::Ok));
        assert_eq!(engine.emit_debug("bad triangle", DebugLevel::Error), Some(ResultCode::Ok));

        context.shutdown();
        assert_eq!(engine.emit_debug("late message", DebugLevel::Warn), None);
    }

    #[test]
    fn test_config_drives_setup() {
        let config = AcousticsConfig::from_toml_str(
            r#"
[scene]
extent = [20.0, 4.0, 20.0]
voxel_size = 0.25
debug_view = true
"#,
        )
        .unwrap();
        let engine = FakeEngine::new();

        let builder = SceneBuilder::from_config(&config.scene).unwrap();
        let (_context, report) = builder.build(engine.clone(), &[wall("w", Vec3::ZERO)]);

        assert_eq!(engine.voxel_grid(), Some((PlVector::new(20.0, 4.0, 20.0), 0.25)));
        assert_eq!(report.debug_view, Some(true));
        assert_eq!(builder.grid().cells_per_axis(), [80, 16, 80]);
    }

    // ============================================================================
    // Runtime Scenarios
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_loop_and_injection_run_together() {
        let engine = FakeEngine::new();
        engine.set_default_occlusion(0.6);
        let builder = SceneBuilder::new(VoxelGridDescriptor::new(Vec3::splat(10.0), 1.0).unwrap());
        let (context, report) = builder.build(engine.clone(), &[wall("door", Vec3::Z)]);
        assert!(report.is_complete());

        let group = ChannelGroupId(1);
        let host = FakeConvolutionHost::default()
            .with_group(group, vec![EffectType::Other(0), EffectType::ConvolutionReverb]);
        let response = ImpulseResponse::from_samples(2, 48_000, vec![0.5; 64]).unwrap();
        let injector =
            ImpulseResponseInjector::new(response, group, 0, Duration::from_millis(1000));
        let listener = StaticPosition(Vec3::new(0.0, 1.7, -3.0));
        let emitter =
            ScriptedEmitter::active_for(Vec3::new(0.0, 0.0, 3.0), Duration::from_millis(2000));
        let simulation = SimulationLoop::new(SimulationSettings::default());

        let (loop_report, injection) = tokio::join!(
            simulation.run(&context, &host, &listener, &emitter),
            injector.run(&host, &emitter),
        );

        assert_eq!(loop_report.stop, StopReason::EmitterInactive);
        assert_eq!(loop_report.ticks, 20);
        assert!(matches!(injection, InjectionOutcome::Injected { effect_index: 1 }));
        assert_eq!(host.injected().len(), 1);
        assert_eq!(host.sink.values().len(), 20);
        assert!(host.sink.values().iter().all(|value| *value == 0.6));
        assert!(engine.query_points().iter().all(|p| *p == Vec3::new(0.0, 1.7, 3.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_middleware_config_drives_injection() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("hall.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
        for sample in [i16::MAX, 0, i16::MIN / 2] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let config = AcousticsConfig::from_toml_str(&format!(
            "[middleware]\nimpulse_response = {:?}\nstartup_delay_ms = 300\nparameter_slot = 4\n",
            wav.display().to_string()
        ))
        .unwrap();
        config.validate().unwrap();

        let group = ChannelGroupId(2);
        let host = FakeConvolutionHost::default()
            .with_group(group, vec![EffectType::ConvolutionReverb]);
        let injector = ImpulseResponseInjector::from_config(&config.middleware, group)
            .unwrap()
            .unwrap();
        let started = tokio::time::Instant::now();

        let outcome = injector.run(&host, &ScriptedEmitter::new(Vec3::ZERO)).await;

        assert!(matches!(outcome, InjectionOutcome::Injected { effect_index: 0 }));
        assert_eq!(started.elapsed(), Duration::from_millis(300));
        let injected = host.injected();
        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0].0, group);
        assert_eq!(injected[0].2, 4);
        // channel count word plus three samples
        assert_eq!(injected[0].3.len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_after_loop() {
        let engine = FakeEngine::new();
        let builder = SceneBuilder::new(VoxelGridDescriptor::new(Vec3::splat(10.0), 1.0).unwrap());
        let (mut context, _report) = builder.build(engine.clone(), &[wall("w", Vec3::ZERO)]);
        let emitter = ScriptedEmitter::new(Vec3::ONE);
        let sink = crate::test_utils::RecordingSink::new();

        let report = SimulationLoop::new(SimulationSettings::default())
            .with_tick_limit(4)
            .run(&context, &sink, &StaticPosition(Vec3::ZERO), &emitter)
            .await;
        context.shutdown();

        assert_eq!(report.ticks, 4);
        assert_eq!(engine.live_handle_count(), 0);
        let last_three: Vec<_> = engine.calls().into_iter().rev().take(3).collect();
        assert_eq!(
            last_three,
            vec![Call::DebugInitialize, Call::SystemRelease, Call::SceneRelease]
        );
    }
}
