use cpal::{Device, Host};
use cpal::traits::{DeviceTrait, HostTrait};
use log::{debug, warn};
use crate::error::AudioError;

/// Output device enumeration and selection
pub struct DeviceManager {
    host: Host,
    devices: Vec<(String, Device)>,
    current_device: Option<Device>,
}

impl DeviceManager {
    pub fn new() -> Result<Self, AudioError> {
        let mut manager = DeviceManager {
            host: cpal::default_host(),
            devices: Vec::new(),
            current_device: None,
        };

        manager.refresh_devices()?;
        Ok(manager)
    }

    /// Re-read the host's output devices. Devices whose name cannot be read are skipped.
    pub fn refresh_devices(&mut self) -> Result<(), AudioError> {
        self.devices.clear();

        let devices = self.host.output_devices()
            .map_err(|e| AudioError::InitializationFailed(format!("Failed to enumerate devices: {}", e)))?;

        for device in devices {
            match device.name() {
                Ok(name) => self.devices.push((name, device)),
                Err(e) => warn!("Skipping output device without a name: {}", e),
            }
        }

        debug!("Found {} output devices on {:?}", self.devices.len(), self.host.id());
        Ok(())
    }

    pub fn list_devices(&self) -> Vec<String> {
        self.devices.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Select a device by name, falling back to the default device.
    ///
    /// When the named device is missing and no default exists either, the
    /// error names the device that was asked for.
    pub fn select_device_with_fallback(&mut self, device_name: Option<&str>) -> Result<(), AudioError> {
        match device_name {
            Some(name) => {
                if let Some((_, device)) = self.devices.iter().find(|(candidate, _)| candidate == name) {
                    self.current_device = Some(device.clone());
                    Ok(())
                } else {
                    warn!("Output device '{}' not found, using the default device", name);
                    self.select_default_device()
                        .map_err(|_| AudioError::DeviceNotFound {
                            device: name.to_string(),
                        })
                }
            }
            None => self.select_default_device(),
        }
    }

    pub fn select_default_device(&mut self) -> Result<(), AudioError> {
        let default_device = self.host.default_output_device()
            .ok_or_else(|| AudioError::InitializationFailed("No default output device available".to_string()))?;

        self.current_device = Some(default_device);
        Ok(())
    }

    pub fn current_device(&self) -> Option<&Device> {
        self.current_device.as_ref()
    }

    pub fn current_device_name(&self) -> Result<Option<String>, AudioError> {
        match &self.current_device {
            Some(device) => {
                let name = device.name()
                    .map_err(|e| AudioError::InitializationFailed(format!("Failed to get device name: {}", e)))?;
                Ok(Some(name))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These run against the host's real audio stack, which CI machines often lack.
    fn manager_with_devices() -> Option<DeviceManager> {
        DeviceManager::new().ok().filter(|manager| !manager.list_devices().is_empty())
    }

    #[test]
    fn test_no_current_device_initially() {
        let Some(manager) = manager_with_devices() else { return };
        assert!(manager.current_device().is_none());
        assert_eq!(manager.current_device_name().unwrap(), None);
    }

    #[test]
    fn test_device_names_not_empty() {
        let Some(manager) = manager_with_devices() else { return };
        for name in manager.list_devices() {
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn test_select_named_device() {
        let Some(mut manager) = manager_with_devices() else { return };
        let first = manager.list_devices()[0].clone();

        manager.select_device_with_fallback(Some(&first)).unwrap();
        assert_eq!(manager.current_device_name().unwrap(), Some(first));
    }

    #[test]
    fn test_unknown_device_falls_back_or_names_request() {
        let Some(mut manager) = manager_with_devices() else { return };

        match manager.select_device_with_fallback(Some("NonExistentDevice")) {
            Ok(()) => assert!(manager.current_device().is_some()),
            Err(AudioError::DeviceNotFound { device }) => assert_eq!(device, "NonExistentDevice"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_refresh_keeps_device_count() {
        let Some(mut manager) = manager_with_devices() else { return };
        let before = manager.list_devices().len();
        manager.refresh_devices().unwrap();
        assert_eq!(manager.list_devices().len(), before);
    }
}
