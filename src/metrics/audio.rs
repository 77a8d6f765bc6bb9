//! Audio endpoint mute state

use super::MetricsError;

/// Mute state of the default speaker and microphone
pub trait AudioState: Send {
    fn is_output_muted(&self) -> Result<bool, MetricsError>;
    fn is_input_muted(&self) -> Result<bool, MetricsError>;
}

/// Queries the default WASAPI endpoints on every call
pub struct EndpointAudioState;

#[cfg(windows)]
impl EndpointAudioState {
    fn endpoint_muted(flow: windows::Win32::Media::Audio::EDataFlow) -> Result<bool, MetricsError> {
        use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
        use windows::Win32::Media::Audio::{eConsole, IMMDeviceEnumerator, MMDeviceEnumerator};
        use windows::Win32::System::Com::{
            CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL,
            COINIT_APARTMENTTHREADED,
        };

        unsafe {
            let initialized = CoInitializeEx(None, COINIT_APARTMENTTHREADED).is_ok();

            let result = (|| {
                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                        .map_err(|e| MetricsError::query("audio", e))?;
                let device = enumerator
                    .GetDefaultAudioEndpoint(flow, eConsole)
                    .map_err(|_| MetricsError::NotPresent("audio endpoint"))?;
                let volume: IAudioEndpointVolume = device
                    .Activate(CLSCTX_ALL, None)
                    .map_err(|e| MetricsError::query("audio", e))?;
                volume
                    .GetMute()
                    .map(|muted| muted.as_bool())
                    .map_err(|e| MetricsError::query("audio", e))
            })();

            if initialized {
                CoUninitialize();
            }
            result
        }
    }
}

#[cfg(windows)]
impl AudioState for EndpointAudioState {
    fn is_output_muted(&self) -> Result<bool, MetricsError> {
        Self::endpoint_muted(windows::Win32::Media::Audio::eRender)
    }

    fn is_input_muted(&self) -> Result<bool, MetricsError> {
        Self::endpoint_muted(windows::Win32::Media::Audio::eCapture)
    }
}

#[cfg(not(windows))]
impl AudioState for EndpointAudioState {
    fn is_output_muted(&self) -> Result<bool, MetricsError> {
        Err(MetricsError::Unsupported("audio"))
    }

    fn is_input_muted(&self) -> Result<bool, MetricsError> {
        Err(MetricsError::Unsupported("audio"))
    }
}
