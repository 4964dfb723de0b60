//! Talon SRX compatibility wrapper.
//!
//! [`CanTalon`] owns a bound [`TalonSrx`] driver handle and re-exposes it
//! through the legacy [`speedcontroller`] contracts, replicating the old
//! API's bookkeeping (stored speed, control mode, encoder multiplier, fixed
//! configuration timeout) on top of the current driver surface.

#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

pub mod adapter;
pub mod talon;

pub use adapter::{CanTalon, CONFIG_TIMEOUT, SMART_DASHBOARD_TYPE};
pub use talon::{ControlMode, FeedbackDevice, NeutralMode, TalonSrx};

#[cfg(not(any(not(test), target_arch = "arm")))]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use fugit::MillisDurationU32;
    use speedcontroller::{Sendable, SendableBuilder, SpeedController};

    use crate::adapter::{CanTalon, CONFIG_TIMEOUT, SMART_DASHBOARD_TYPE};
    use crate::talon::{ControlMode, FeedbackDevice, NeutralMode, TalonSrx};

    /// One forwarded operation observed by the fake handle
    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Set(ControlMode, f64),
        NeutralOutput,
        SetNeutralMode(NeutralMode),
        SetInverted(bool),
        SetSensorPhase(bool),
        ConfigSelectedFeedbackSensor(FeedbackDevice, u8, u32),
        ConfigKp(u8, f64, u32),
        ConfigKi(u8, f64, u32),
        ConfigKd(u8, f64, u32),
        ConfigKf(u8, f64, u32),
        ConfigIntegralZone(u8, i32, u32),
        ConfigClosedLoopRamp(f64, u32),
        SelectProfileSlot(u8, u8),
        SelectedSensorPosition(u8),
        SelectedSensorVelocity(u8),
        ClearStickyFaults(u32),
    }

    /// Recording double of the driver handle. Every forwarded operation is
    /// logged; `fail` makes the mutating operations report a driver error
    /// after recording.
    #[derive(Debug, Default)]
    struct FakeTalon {
        calls: Vec<Call>,
        inverted: bool,
        position: i32,
        velocity: i32,
        current: f64,
        name: Option<String>,
        subsystem: Option<String>,
        fail: bool,
    }

    impl FakeTalon {
        fn record(&mut self, call: Call) -> Result<(), &'static str> {
            self.calls.push(call);
            if self.fail {
                Err("driver error")
            } else {
                Ok(())
            }
        }
    }

    impl TalonSrx for FakeTalon {
        type Error = &'static str;

        fn set(&mut self, mode: ControlMode, output: f64) -> Result<(), Self::Error> {
            self.record(Call::Set(mode, output))
        }

        fn neutral_output(&mut self) -> Result<(), Self::Error> {
            self.record(Call::NeutralOutput)
        }

        fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), Self::Error> {
            self.record(Call::SetNeutralMode(mode))
        }

        fn inverted(&self) -> Result<bool, Self::Error> {
            Ok(self.inverted)
        }

        fn set_inverted(&mut self, inverted: bool) -> Result<(), Self::Error> {
            self.inverted = inverted;
            self.record(Call::SetInverted(inverted))
        }

        fn set_sensor_phase(&mut self, reversed: bool) -> Result<(), Self::Error> {
            self.record(Call::SetSensorPhase(reversed))
        }

        fn config_selected_feedback_sensor(
            &mut self,
            device: FeedbackDevice,
            pid_idx: u8,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigSelectedFeedbackSensor(
                device,
                pid_idx,
                timeout.ticks(),
            ))
        }

        fn config_kp(
            &mut self,
            slot: u8,
            gain: f64,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigKp(slot, gain, timeout.ticks()))
        }

        fn config_ki(
            &mut self,
            slot: u8,
            gain: f64,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigKi(slot, gain, timeout.ticks()))
        }

        fn config_kd(
            &mut self,
            slot: u8,
            gain: f64,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigKd(slot, gain, timeout.ticks()))
        }

        fn config_kf(
            &mut self,
            slot: u8,
            gain: f64,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigKf(slot, gain, timeout.ticks()))
        }

        fn config_integral_zone(
            &mut self,
            slot: u8,
            integral_zone: i32,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigIntegralZone(slot, integral_zone, timeout.ticks()))
        }

        fn config_closed_loop_ramp(
            &mut self,
            seconds_from_neutral_to_full: f64,
            timeout: MillisDurationU32,
        ) -> Result<(), Self::Error> {
            self.record(Call::ConfigClosedLoopRamp(
                seconds_from_neutral_to_full,
                timeout.ticks(),
            ))
        }

        fn select_profile_slot(&mut self, slot: u8, pid_idx: u8) -> Result<(), Self::Error> {
            self.record(Call::SelectProfileSlot(slot, pid_idx))
        }

        fn selected_sensor_position(&mut self, pid_idx: u8) -> Result<i32, Self::Error> {
            self.calls.push(Call::SelectedSensorPosition(pid_idx));
            Ok(self.position)
        }

        fn selected_sensor_velocity(&mut self, pid_idx: u8) -> Result<i32, Self::Error> {
            self.calls.push(Call::SelectedSensorVelocity(pid_idx));
            Ok(self.velocity)
        }

        fn output_current(&mut self) -> Result<f64, Self::Error> {
            Ok(self.current)
        }

        fn clear_sticky_faults(&mut self, timeout: MillisDurationU32) -> Result<(), Self::Error> {
            self.record(Call::ClearStickyFaults(timeout.ticks()))
        }

        fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        fn set_name(&mut self, name: &str) {
            self.name = Some(name.to_string());
        }

        fn subsystem(&self) -> Option<&str> {
            self.subsystem.as_deref()
        }

        fn set_subsystem(&mut self, subsystem: &str) {
            self.subsystem = Some(subsystem.to_string());
        }
    }

    /// Minimal comparable/hashable handle for the identity tests
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct IdentityTalon(u8);

    impl TalonSrx for IdentityTalon {
        type Error = ();

        fn set(&mut self, _mode: ControlMode, _output: f64) -> Result<(), ()> {
            Ok(())
        }

        fn neutral_output(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn set_neutral_mode(&mut self, _mode: NeutralMode) -> Result<(), ()> {
            Ok(())
        }

        fn inverted(&self) -> Result<bool, ()> {
            Ok(false)
        }

        fn set_inverted(&mut self, _inverted: bool) -> Result<(), ()> {
            Ok(())
        }

        fn set_sensor_phase(&mut self, _reversed: bool) -> Result<(), ()> {
            Ok(())
        }

        fn config_selected_feedback_sensor(
            &mut self,
            _device: FeedbackDevice,
            _pid_idx: u8,
            _timeout: MillisDurationU32,
        ) -> Result<(), ()> {
            Ok(())
        }

        fn config_kp(&mut self, _slot: u8, _gain: f64, _timeout: MillisDurationU32) -> Result<(), ()> {
            Ok(())
        }

        fn config_ki(&mut self, _slot: u8, _gain: f64, _timeout: MillisDurationU32) -> Result<(), ()> {
            Ok(())
        }

        fn config_kd(&mut self, _slot: u8, _gain: f64, _timeout: MillisDurationU32) -> Result<(), ()> {
            Ok(())
        }

        fn config_kf(&mut self, _slot: u8, _gain: f64, _timeout: MillisDurationU32) -> Result<(), ()> {
            Ok(())
        }

        fn config_integral_zone(
            &mut self,
            _slot: u8,
            _integral_zone: i32,
            _timeout: MillisDurationU32,
        ) -> Result<(), ()> {
            Ok(())
        }

        fn config_closed_loop_ramp(
            &mut self,
            _seconds_from_neutral_to_full: f64,
            _timeout: MillisDurationU32,
        ) -> Result<(), ()> {
            Ok(())
        }

        fn select_profile_slot(&mut self, _slot: u8, _pid_idx: u8) -> Result<(), ()> {
            Ok(())
        }

        fn selected_sensor_position(&mut self, _pid_idx: u8) -> Result<i32, ()> {
            Ok(0)
        }

        fn selected_sensor_velocity(&mut self, _pid_idx: u8) -> Result<i32, ()> {
            Ok(0)
        }

        fn output_current(&mut self) -> Result<f64, ()> {
            Ok(0.0)
        }

        fn clear_sticky_faults(&mut self, _timeout: MillisDurationU32) -> Result<(), ()> {
            Ok(())
        }

        fn name(&self) -> Option<&str> {
            None
        }

        fn set_name(&mut self, _name: &str) {}

        fn subsystem(&self) -> Option<&str> {
            None
        }

        fn set_subsystem(&mut self, _subsystem: &str) {}
    }

    /// Recording double of the dashboard builder
    struct RecordingBuilder<S> {
        dashboard_type: Option<&'static str>,
        safe_state: Option<fn(&mut S)>,
        property: Option<(&'static str, fn(&S) -> f64, fn(&mut S, f64))>,
    }

    impl<S> RecordingBuilder<S> {
        fn new() -> Self {
            Self {
                dashboard_type: None,
                safe_state: None,
                property: None,
            }
        }
    }

    impl<S> SendableBuilder<S> for RecordingBuilder<S> {
        fn set_smart_dashboard_type(&mut self, kind: &'static str) {
            self.dashboard_type = Some(kind);
        }

        fn set_safe_state(&mut self, safe_state: fn(&mut S)) {
            self.safe_state = Some(safe_state);
        }

        fn add_double_property(
            &mut self,
            name: &'static str,
            getter: fn(&S) -> f64,
            setter: fn(&mut S, f64),
        ) {
            self.property = Some((name, getter, setter));
        }
    }

    fn adapter() -> CanTalon<FakeTalon> {
        CanTalon::new(3, FakeTalon::default())
    }

    #[test]
    fn fresh_wrapper_is_neutral_in_percent_output() {
        let talon = adapter();
        assert_eq!(talon.get(), 0.0);
        assert_eq!(talon.control_mode(), ControlMode::PercentOutput);
        assert_eq!(talon.device_number(), 3);
        assert!(talon.talon().calls.is_empty());
    }

    #[test]
    fn set_stores_the_speed_exactly() {
        let mut talon = adapter();
        talon.set(0.37).unwrap();
        assert_eq!(talon.get(), 0.37);
        assert_eq!(
            talon.talon().calls,
            vec![Call::Set(ControlMode::PercentOutput, 0.37)]
        );
    }

    #[test]
    fn stored_speed_stays_unscaled_with_a_multiplier() {
        let mut talon = adapter();
        talon.config_encoder_codes_per_rev(360);
        talon.set(0.5).unwrap();
        assert_eq!(talon.get(), 0.5);
    }

    #[test]
    fn multiplier_applies_to_set_but_not_pid_write_or_enable() {
        let mut talon = adapter();
        talon.config_encoder_codes_per_rev(360);

        talon.set(0.5).unwrap();
        talon.pid_write(0.5).unwrap();
        talon.enable().unwrap();

        assert_eq!(
            talon.talon().calls,
            vec![
                Call::Set(ControlMode::PercentOutput, 180.0),
                Call::Set(ControlMode::PercentOutput, 0.5),
                Call::Set(ControlMode::PercentOutput, 0.5),
            ]
        );
    }

    #[test]
    fn control_mode_change_has_no_effect_until_the_next_command() {
        let mut talon = adapter();
        talon.change_control_mode(ControlMode::Velocity);
        assert!(talon.talon().calls.is_empty());
        talon.set(0.25).unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![Call::Set(ControlMode::Velocity, 0.25)]
        );
    }

    #[test]
    fn disable_and_stop_motor_both_command_neutral() {
        let mut talon = adapter();
        talon.set(0.8).unwrap();
        talon.disable().unwrap();
        talon.stop_motor().unwrap();
        assert_eq!(
            &talon.talon().calls[1..],
            &[Call::NeutralOutput, Call::NeutralOutput]
        );
    }

    #[test]
    fn encoder_codes_per_rev_is_pure_local_state() {
        let mut talon = adapter();
        talon.config_encoder_codes_per_rev(512);
        assert!(talon.talon().calls.is_empty());

        talon.set(1.0).unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![Call::Set(ControlMode::PercentOutput, 512.0)]
        );
    }

    #[test]
    fn brake_mode_maps_to_the_neutral_behavior() {
        let mut talon = adapter();
        talon.enable_brake_mode(true).unwrap();
        talon.enable_brake_mode(false).unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![
                Call::SetNeutralMode(NeutralMode::Brake),
                Call::SetNeutralMode(NeutralMode::Coast),
            ]
        );
    }

    #[test]
    fn inversion_and_sensor_phase_forward() {
        let mut talon = adapter();
        talon.set_inverted(true).unwrap();
        assert!(talon.inverted().unwrap());
        talon.reverse_sensor(true).unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![Call::SetInverted(true), Call::SetSensorPhase(true)]
        );
    }

    #[test]
    fn feedback_device_goes_to_the_fixed_slot_with_the_fixed_timeout() {
        let mut talon = adapter();
        talon.set_feedback_device(FeedbackDevice::QuadEncoder).unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![Call::ConfigSelectedFeedbackSensor(
                FeedbackDevice::QuadEncoder,
                0,
                100
            )]
        );
    }

    #[test]
    fn sensor_reads_pass_through() {
        let mut talon = CanTalon::new(
            3,
            FakeTalon {
                position: 4096,
                velocity: -87,
                current: 12.5,
                ..FakeTalon::default()
            },
        );
        assert_eq!(talon.selected_sensor_position().unwrap(), 4096);
        assert_eq!(talon.selected_sensor_velocity().unwrap(), -87);
        assert_eq!(talon.output_current().unwrap(), 12.5);
        // reads always target closed loop slot 0
        assert_eq!(
            talon.talon().calls,
            vec![
                Call::SelectedSensorPosition(0),
                Call::SelectedSensorVelocity(0),
            ]
        );
    }

    #[test]
    fn set_pid_issues_the_fixed_configuration_sequence() {
        let mut talon = adapter();
        talon.set_pid(1.0, 0.1, 0.01, 0.0, 50, 0.2, 0).unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![
                Call::ConfigKp(0, 1.0, 100),
                Call::ConfigKi(0, 0.1, 100),
                Call::ConfigKd(0, 0.01, 100),
                Call::ConfigKf(0, 0.0, 100),
                Call::ConfigIntegralZone(0, 50, 100),
                Call::ConfigClosedLoopRamp(0.2, 100),
                Call::SelectProfileSlot(0, 0),
            ]
        );
    }

    #[test]
    fn set_pid_stops_at_the_first_failure() {
        let mut talon = CanTalon::new(
            3,
            FakeTalon {
                fail: true,
                ..FakeTalon::default()
            },
        );
        assert_eq!(
            talon.set_pid(1.0, 0.1, 0.01, 0.0, 50, 0.2, 1),
            Err("driver error")
        );
        // the first call already took effect, the rest were skipped
        assert_eq!(talon.talon().calls, vec![Call::ConfigKp(1, 1.0, 100)]);
    }

    #[test]
    #[allow(deprecated)]
    fn voltage_configuration_touches_nothing() {
        let mut talon = adapter();
        talon.config_nominal_output_voltage(12.0, -12.0);
        talon.config_peak_output_voltage(12.0, -12.0);
        assert!(talon.talon().calls.is_empty());
    }

    #[test]
    #[allow(deprecated)]
    fn clear_sticky_faults_still_forwards() {
        let mut talon = adapter();
        talon.clear_sticky_faults().unwrap();
        assert_eq!(
            talon.talon().calls,
            vec![Call::ClearStickyFaults(CONFIG_TIMEOUT.ticks())]
        );
    }

    #[test]
    fn failed_forward_still_updates_the_stored_speed() {
        let mut talon = CanTalon::new(
            3,
            FakeTalon {
                fail: true,
                ..FakeTalon::default()
            },
        );
        assert_eq!(talon.set(0.6), Err("driver error"));
        assert_eq!(talon.get(), 0.6);
    }

    #[test]
    fn identity_is_device_number_plus_handle() {
        let a = CanTalon::new(7, IdentityTalon(7));
        let mut b = CanTalon::new(7, IdentityTalon(7));
        let c = CanTalon::new(8, IdentityTalon(8));

        // command state does not participate in identity
        b.set(0.4).unwrap();
        b.change_control_mode(ControlMode::Velocity);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut hash_a = DefaultHasher::new();
        a.hash(&mut hash_a);
        let mut hash_b = DefaultHasher::new();
        b.hash(&mut hash_b);
        assert_eq!(hash_a.finish(), hash_b.finish());
    }

    #[test]
    fn display_label_includes_assigned_metadata() {
        let mut talon = adapter();
        assert_eq!(talon.to_string(), "CanTalon(3)");

        talon.set_subsystem("Drive");
        assert_eq!(talon.to_string(), "CanTalon(3,Drive)");

        let mut named_only = adapter();
        named_only.set_name("left front");
        assert_eq!(named_only.to_string(), "CanTalon(3,left front)");

        talon.set_name("left front");
        assert_eq!(talon.to_string(), "CanTalon(3,Drive,left front)");
        assert_eq!(talon.name(), Some("left front"));
        assert_eq!(talon.subsystem(), Some("Drive"));
    }

    #[test]
    fn dashboard_bindings_drive_the_wrapper() {
        let mut talon = adapter();
        let mut builder = RecordingBuilder::new();
        talon.init_sendable(&mut builder);

        assert_eq!(builder.dashboard_type, Some(SMART_DASHBOARD_TYPE));
        assert_eq!(talon.smart_dashboard_type(), SMART_DASHBOARD_TYPE);

        builder.safe_state.unwrap()(&mut talon);
        assert_eq!(talon.talon().calls, vec![Call::NeutralOutput]);

        let (name, getter, setter) = builder.property.unwrap();
        assert_eq!(name, "Value");
        setter(&mut talon, 0.25);
        assert_eq!(getter(&talon), 0.25);
        assert_eq!(
            talon.talon().calls.last(),
            Some(&Call::Set(ControlMode::PercentOutput, 0.25))
        );
    }

    #[test]
    fn wrapper_is_usable_through_the_legacy_contract() {
        fn drive(controller: &mut impl SpeedController<Error = &'static str>) {
            controller.set(0.3).unwrap();
            controller.stop_motor().unwrap();
        }

        let mut talon = adapter();
        drive(&mut talon);
        assert_eq!(
            talon.talon().calls,
            vec![
                Call::Set(ControlMode::PercentOutput, 0.3),
                Call::NeutralOutput,
            ]
        );
    }
}
