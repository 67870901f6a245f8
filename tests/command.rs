mod tests {
    use embassy_time::Duration;
    use myrtio_segment_controller::channel::{Channel, TryReceiveError, TrySendError};
    use myrtio_segment_controller::preset::{PresetError, PresetName};
    use myrtio_segment_controller::segment::{LightChannel, SegmentGeometry};
    use myrtio_segment_controller::{Command, CommandChannel, ControlError, LightHandle};

    #[test]
    fn test_channel_is_fifo_and_bounded() {
        let channel = Channel::<u8, 2>::new();
        let sender = channel.sender();
        let receiver = channel.receiver();

        assert_eq!(channel.capacity(), 2);
        assert!(sender.try_send(1).is_ok());
        assert!(sender.try_send(2).is_ok());
        assert!(sender.is_full());
        assert_eq!(sender.try_send(3), Err(TrySendError(3)));
        assert_eq!(channel.len(), 2);

        assert_eq!(receiver.try_receive(), Ok(1));
        assert_eq!(receiver.try_receive(), Ok(2));
        assert_eq!(receiver.try_receive(), Err(TryReceiveError));
        assert!(channel.is_empty());
    }

    #[test]
    fn test_channel_drain_and_clear() {
        let channel = Channel::<u8, 4>::new();
        for value in 0..3 {
            channel.try_send(value).unwrap();
        }
        let drained: Vec<u8> = channel.receiver().drain().collect();
        assert_eq!(drained, vec![0, 1, 2]);

        channel.try_send(9).unwrap();
        channel.clear();
        assert!(channel.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let bad_segment = Command::SetOn {
            segment: 8,
            on: true,
        };
        assert_eq!(bad_segment.validate(), Err(ControlError::SegmentOutOfRange));

        let bad_saturation = Command::SetTarget {
            segment: 0,
            channel: LightChannel::Saturation,
            value: 255,
            duration: None,
        };
        assert_eq!(bad_saturation.validate(), Err(ControlError::ValueOutOfRange));

        let bad_strip = Command::SetGeometry {
            segment: 1,
            geometry: SegmentGeometry::new(0, 4, 3),
        };
        assert_eq!(bad_strip.validate(), Err(ControlError::StripOutOfRange));

        assert_eq!(
            Command::RecallPreset(8).validate(),
            Err(ControlError::Preset(PresetError::InvalidSlot))
        );
        assert_eq!(
            Command::SavePresetByName(PresetName::new()).validate(),
            Err(ControlError::Preset(PresetError::EmptyName))
        );
        assert_eq!(
            Command::SetStripLength {
                strip: 1,
                length: 600
            }
            .validate(),
            Err(ControlError::ValueOutOfRange)
        );
    }

    #[test]
    fn test_validate_accepts_range_limits() {
        let limits = [
            (LightChannel::Level, 254),
            (LightChannel::Hue, 360),
            (LightChannel::Saturation, 254),
            (LightChannel::ColorTemperature, 153),
            (LightChannel::ColorTemperature, 370),
        ];
        for (channel, value) in limits {
            let command = Command::SetTarget {
                segment: 7,
                channel,
                value,
                duration: Some(Duration::from_millis(10)),
            };
            assert_eq!(command.validate(), Ok(()), "{channel:?} {value}");
        }
        assert_eq!(Command::SetGlobalTransition(Duration::from_secs(5)).validate(), Ok(()));
    }

    #[test]
    fn test_handle_queues_valid_commands() {
        let channel = CommandChannel::<4>::new();
        let handle = LightHandle::new(channel.sender());

        handle.set_level(3, 100).unwrap();
        handle.set_hue(3, 361).unwrap_err();
        assert_eq!(channel.len(), 1);
        assert_eq!(
            channel.try_receive(),
            Ok(Command::SetTarget {
                segment: 3,
                channel: LightChannel::Level,
                value: 100,
                duration: None,
            })
        );
    }

    #[test]
    fn test_handle_reports_full_queue() {
        let channel = CommandChannel::<2>::new();
        let handle = LightHandle::new(channel.sender());

        handle.set_on(0, true).unwrap();
        handle.set_on(1, true).unwrap();
        assert_eq!(handle.set_on(2, true), Err(ControlError::QueueFull));
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn test_handle_preset_names() {
        let channel = CommandChannel::<4>::new();
        let handle = LightHandle::new(channel.sender());

        assert_eq!(
            handle.save_preset(0, Some("seventeen chars!!")),
            Err(ControlError::Preset(PresetError::NameTooLong))
        );
        assert_eq!(
            handle.recall_preset_by_name(""),
            Err(ControlError::Preset(PresetError::EmptyName))
        );
        assert!(channel.is_empty());

        // The save name is cut instead of rejected
        handle.set_preset_save_name("seventeen chars!!").unwrap();
        let Ok(Command::SetPresetSaveName(name)) = channel.try_receive() else {
            panic!("expected a save name command");
        };
        assert_eq!(name.as_str(), "seventeen chars!");
    }
}
