// Integration tests for the fixed-cadence motion executor

#[cfg(test)]
mod tests {
    use stepper_arm::Config;
    use stepper_arm::motion::{
        ArmVariant, MotionError, MotionEvent, MotionExecutor, MotionRequest, MotionState,
        RecordingActuator,
    };

    const TICK_US: u64 = 250;
    const STEP_ANGLE: f64 = 0.225;

    fn executor(variant: ArmVariant) -> MotionExecutor<RecordingActuator> {
        let config = Config::preset(variant);
        MotionExecutor::new(
            config.build_model(),
            RecordingActuator::new(variant.joint_count()),
            config.path_settings(),
            config.timing.poll_interval_us,
        )
    }

    /// Ticks every poll interval until the path completes. Returns the
    /// completion event and the time it fired.
    fn run_to_completion(
        exec: &mut MotionExecutor<RecordingActuator>,
        mut now_us: u64,
        limit_us: u64,
    ) -> (MotionEvent, u64) {
        while now_us <= limit_us {
            if let Some(event) = exec.tick(now_us).unwrap() {
                return (event, now_us);
            }
            now_us += TICK_US;
        }
        panic!("path did not complete before {} us", limit_us);
    }

    fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
    }

    #[test]
    fn test_joint_interpolation_reaches_goal() {
        let mut exec = executor(ArmVariant::Planar);
        let events = exec
            .start(&MotionRequest::InterpolateToJoint(vec![30.0, -10.0]), 0)
            .unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            MotionEvent::Started { state, from, to, duration } => {
                assert_eq!(*state, MotionState::Interpolating);
                assert_eq!(from, &vec![0.0, 0.0]);
                assert_eq!(to, &vec![30.0, -10.0]);
                assert!((duration - 1.15).abs() < 1e-9);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(exec.state(), MotionState::Interpolating);

        let (event, done_at) = run_to_completion(&mut exec, 0, 3_000_000);
        assert!(done_at > 1_149_750 && done_at <= 1_150_500);
        assert!(matches!(
            event,
            MotionEvent::Completed { state: MotionState::Interpolating, .. }
        ));
        assert!(exec.is_idle());

        let angles = exec.angles();
        assert!((angles[0] - 30.0).abs() <= STEP_ANGLE);
        assert!((angles[1] + 10.0).abs() <= STEP_ANGLE);

        let stats = exec.stats();
        assert_eq!(stats.completed_paths, 1);
        for (joint, goal) in [30.0_f64, -10.0].iter().enumerate() {
            let expected = (goal.abs() / STEP_ANGLE).round();
            let pulses = stats.pulses[joint] as f64;
            assert!((pulses - expected).abs() <= 1.0, "joint {} pulsed {} times", joint, pulses);
            assert_eq!(exec.actuator().pulses_for(joint) as u64, stats.pulses[joint]);
        }
    }

    #[test]
    fn test_inverted_joint_pulses_reversed() {
        let mut exec = executor(ArmVariant::Planar);
        exec.start(&MotionRequest::InterpolateToJoint(vec![20.0, -15.0]), 0)
            .unwrap();
        run_to_completion(&mut exec, 0, 3_000_000);

        let counts = exec.model().step_counts();
        assert!(counts[0] > 0);
        assert!(counts[1] < 0);
        // Joint 0 is wired backwards, joint 1 is not.
        assert_eq!(exec.actuator().net_steps(0), -counts[0]);
        assert_eq!(exec.actuator().net_steps(1), counts[1]);
    }

    #[test]
    fn test_line_keeps_to_cartesian_segment() {
        let mut exec = executor(ArmVariant::YawPlanar);
        let home = exec.current_pose().unwrap();
        assert!(distance(home, [200.0, 0.0, 250.0]) < 1e-9);

        let events = exec
            .start(&MotionRequest::LineTo([300.0, 0.0, 100.0]), 0)
            .unwrap();
        let duration = match &events[0] {
            MotionEvent::Started { state, duration, .. } => {
                assert_eq!(*state, MotionState::DrawingLine);
                *duration
            }
            other => panic!("unexpected event {:?}", other),
        };
        assert!(duration > 0.0);

        // Walk to the middle of the path; smoothstep puts the target at the
        // segment midpoint there.
        let half_us = (duration * 0.5e6) as u64 / TICK_US * TICK_US;
        let mut now = 0;
        while now <= half_us {
            assert!(exec.tick(now).unwrap().is_none());
            now += TICK_US;
        }
        let pose = exec.current_pose().unwrap();
        assert!(distance(pose, [250.0, 0.0, 175.0]) < 3.0, "midway pose {:?}", pose);

        let (event, _) = run_to_completion(&mut exec, now, 20_000_000);
        assert!(matches!(
            event,
            MotionEvent::Completed { state: MotionState::DrawingLine, .. }
        ));
        let pose = exec.current_pose().unwrap();
        assert!(distance(pose, [300.0, 0.0, 100.0]) < 3.0, "final pose {:?}", pose);
        assert_eq!(exec.stats().skipped_ticks, 0);
    }

    #[test]
    fn test_unreachable_request_leaves_state_alone() {
        let mut exec = executor(ArmVariant::YawPlanar);

        let err = exec
            .start(&MotionRequest::LineTo([1000.0, 0.0, 0.0]), 0)
            .unwrap_err();
        assert!(matches!(err, MotionError::Kinematics(_)));
        assert!(exec.is_idle());
        assert!(exec.tick(0).unwrap().is_none());
        assert!(exec.actuator().commands().is_empty());

        // A running path survives a rejected request.
        exec.start(&MotionRequest::InterpolateToJoint(vec![10.0, 5.0, -5.0]), 0)
            .unwrap();
        for i in 1..=400 {
            exec.tick(i * TICK_US).unwrap();
        }
        let before = exec.active_path().cloned();
        assert!(exec
            .start(&MotionRequest::InterpolateToCartesian([0.0, 0.0, 900.0]), 100_000)
            .is_err());
        assert_eq!(exec.active_path().cloned(), before);
        assert_eq!(exec.state(), MotionState::Interpolating);
        assert_eq!(exec.stats().preempted_paths, 0);

        run_to_completion(&mut exec, 100_250, 10_000_000);
        let angles = exec.angles();
        for (angle, goal) in angles.iter().zip([10.0, 5.0, -5.0]) {
            assert!((angle - goal).abs() <= STEP_ANGLE);
        }
    }

    #[test]
    fn test_wrong_joint_count_is_rejected() {
        let mut exec = executor(ArmVariant::Planar);
        let err = exec
            .start(&MotionRequest::InterpolateToJoint(vec![1.0, 2.0, 3.0]), 0)
            .unwrap_err();
        assert!(matches!(err, MotionError::InvalidRequest(_)));
        assert!(exec.is_idle());
    }

    #[test]
    fn test_new_request_preempts_running_path() {
        let mut exec = executor(ArmVariant::YawPlanar);
        exec.start(&MotionRequest::InterpolateToJoint(vec![90.0, 0.0, 0.0]), 0)
            .unwrap();
        let mut now = 0;
        while now <= 1_000_000 {
            assert!(exec.tick(now).unwrap().is_none());
            now += TICK_US;
        }
        let midway = exec.angles();
        assert!(midway[0] > 0.0 && midway[0] < 90.0);

        let events = exec
            .start(&MotionRequest::InterpolateToJoint(vec![0.0, 0.0, 0.0]), now)
            .unwrap();
        assert_eq!(events.len(), 2);
        match &events[0] {
            MotionEvent::Preempted { state, elapsed } => {
                assert_eq!(*state, MotionState::Interpolating);
                assert!((elapsed - 1.00025).abs() < 1e-9);
            }
            other => panic!("expected preemption, got {:?}", other),
        }
        match &events[1] {
            MotionEvent::Started { from, to, .. } => {
                assert_eq!(from, &midway);
                assert_eq!(to, &vec![0.0, 0.0, 0.0]);
            }
            other => panic!("expected start, got {:?}", other),
        }
        assert_eq!(exec.stats().preempted_paths, 1);

        run_to_completion(&mut exec, now, 20_000_000);
        assert!(exec.angles()[0].abs() <= STEP_ANGLE);
        assert_eq!(exec.stats().completed_paths, 1);
    }

    #[test]
    fn test_poll_interval_gates_ticks() {
        let mut exec = executor(ArmVariant::Planar);
        exec.start(&MotionRequest::InterpolateToJoint(vec![45.0, 45.0]), 0)
            .unwrap();

        exec.tick(0).unwrap();
        assert_eq!(exec.stats().ticks, 1);
        exec.tick(100).unwrap();
        exec.tick(249).unwrap();
        assert_eq!(exec.stats().ticks, 1);
        exec.tick(250).unwrap();
        assert_eq!(exec.stats().ticks, 2);

        // A burst of calls between polls never emits extra pulses.
        let pulses_before = exec.actuator().commands().len();
        for t in 251..500 {
            exec.tick(t).unwrap();
        }
        assert_eq!(exec.actuator().commands().len(), pulses_before);
    }

    #[test]
    fn test_at_most_one_pulse_per_joint_per_tick() {
        let mut exec = executor(ArmVariant::YawPlanar);
        exec.start(&MotionRequest::InterpolateToJoint(vec![-60.0, 30.0, 20.0]), 0)
            .unwrap();
        let mut now = 0;
        loop {
            let before = exec.actuator().commands().len();
            let done = exec.tick(now).unwrap().is_some();
            let emitted = &exec.actuator().commands()[before..];
            assert!(emitted.len() <= 3);
            for joint in 0..3 {
                assert!(emitted.iter().filter(|c| c.joint == joint).count() <= 1);
            }
            if done {
                break;
            }
            now += TICK_US;
            assert!(now < 30_000_000);
        }
    }

    #[test]
    fn test_circle_returns_to_entry_point() {
        let mut exec = executor(ArmVariant::YawPlanar);
        let request = MotionRequest::CircleAt {
            radius: 50.0,
            center_x: 250.0,
            center_z: 200.0,
        };
        let events = exec.start(&request, 0).unwrap();
        let duration = match &events[0] {
            MotionEvent::Started { state, duration, .. } => {
                assert_eq!(*state, MotionState::DrawingCircle);
                *duration
            }
            other => panic!("unexpected event {:?}", other),
        };
        let circle_time = std::f64::consts::TAU * 50.0 / 150.0;
        let blend = duration - circle_time;
        assert!(blend > 0.0);

        // A third of the way around the circle the arm is on the circumference.
        let probe_us = ((blend + circle_time / 3.0) * 1e6) as u64 / TICK_US * TICK_US;
        let mut now = 0;
        while now <= probe_us {
            assert!(exec.tick(now).unwrap().is_none());
            now += TICK_US;
        }
        let pose = exec.current_pose().unwrap();
        let off_center = ((pose[0] - 250.0).powi(2) + (pose[2] - 200.0).powi(2)).sqrt();
        assert!((off_center - 50.0).abs() < 3.0, "pose {:?}", pose);
        assert!(pose[1].abs() < 3.0);

        let (event, _) = run_to_completion(&mut exec, now, 30_000_000);
        assert!(matches!(
            event,
            MotionEvent::Completed { state: MotionState::DrawingCircle, .. }
        ));
        let pose = exec.current_pose().unwrap();
        assert!(distance(pose, [300.0, 0.0, 200.0]) < 3.0, "final pose {:?}", pose);
    }

    #[test]
    fn test_circle_rejects_non_positive_radius() {
        let mut exec = executor(ArmVariant::YawPlanar);
        for radius in [0.0, -10.0, f64::NAN] {
            let request = MotionRequest::CircleAt {
                radius,
                center_x: 250.0,
                center_z: 200.0,
            };
            assert!(matches!(
                exec.start(&request, 0),
                Err(MotionError::InvalidRequest(_))
            ));
        }
        assert!(exec.is_idle());
    }

    #[test]
    fn test_zero_length_move_completes_on_next_tick() {
        let mut exec = executor(ArmVariant::Planar);
        exec.start(&MotionRequest::InterpolateToJoint(vec![0.0, 0.0]), 0)
            .unwrap();
        // Elapsed must exceed the zero duration, so the first tick still runs.
        assert!(exec.tick(0).unwrap().is_none());
        assert!(matches!(
            exec.tick(TICK_US).unwrap(),
            Some(MotionEvent::Completed { .. })
        ));
        assert!(exec.actuator().commands().is_empty());
    }
}
