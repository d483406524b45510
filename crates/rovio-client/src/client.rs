//! Device client facade
//!
//! One method per device command. Each call builds the request, runs it
//! through the transport, parses the body and checks the `responses` code.

use rovio_core::{
    parse_response, Command, McuReport, NavState, ResponseCode, ResponseMap, Result, RovioError,
    TelemetryReport,
};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ConnectionSettings};
use crate::request::{build, CommandArgs};
use crate::transport::{HttpTransport, Transport};

/// Client for one Rovio
pub struct DeviceClient<T = HttpTransport> {
    name: String,
    config: ClientConfig,
    transport: T,
}

impl DeviceClient<HttpTransport> {
    /// Client talking HTTP, using the configured timeout
    pub fn new(name: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(name, config, transport))
    }
}

impl<T: Transport> DeviceClient<T> {
    pub fn with_transport(name: impl Into<String>, config: ClientConfig, transport: T) -> Self {
        Self {
            name: name.into(),
            config,
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Point the client at a new host/port/credentials
    pub fn reconfigure(&mut self, settings: ConnectionSettings) -> Result<()> {
        self.config.reconfigure(settings)?;
        info!(device = %self.name, host = %self.config.host(), "Device connection updated");
        Ok(())
    }

    pub fn set_default_speed(&mut self, speed: u8) -> Result<()> {
        self.config.set_default_speed(speed)
    }

    /// Send a command and return the raw body
    pub async fn send(&self, command: Command, args: &CommandArgs) -> Result<Vec<u8>> {
        let request = build(&self.config, command.spec(), args)?;
        debug!(device = %self.name, command = %command, url = %request.url, "Sending command");
        self.transport.execute(&request).await
    }

    async fn send_text(&self, command: Command, args: &CommandArgs) -> Result<String> {
        let body = self.send(command, args).await?;
        String::from_utf8(body).map_err(|e| {
            RovioError::MalformedResponse(format!("{} response is not UTF-8: {}", command, e))
        })
    }

    /// Send a command, parse the reply and reject non-SUCCESS codes
    pub async fn query(&self, command: Command, args: &CommandArgs) -> Result<ResponseMap> {
        let text = self.send_text(command, args).await?;
        let map = parse_response(&text)?;
        if let Err(e) = map.check(command.name()) {
            warn!(device = %self.name, command = %command, error = %e, "Command failed");
            return Err(e);
        }
        Ok(map)
    }

    /// Run a command whose only result is its response code
    async fn simple(&self, command: Command, args: &CommandArgs) -> Result<ResponseCode> {
        self.query(command, args).await?.check(command.name())?.ok_or_else(|| {
            RovioError::MalformedResponse(format!("{} response has no responses field", command))
        })
    }

    /// Settings scripts answer with an empty body, a `responses` line, or
    /// the RedirectURL page when one was given
    async fn setting(&self, command: Command, args: &CommandArgs) -> Result<ResponseCode> {
        let body = self.send(command, args).await?;
        let text = String::from_utf8_lossy(&body);
        match parse_response(&text) {
            Ok(map) => Ok(map.check(command.name())?.unwrap_or(ResponseCode::Success)),
            Err(e) => {
                debug!(
                    device = %self.name,
                    command = %command,
                    error = %e,
                    "Setting reply is not key=value, treating HTTP success as SUCCESS"
                );
                Ok(ResponseCode::Success)
            }
        }
    }

    async fn drive(&self, command: Command, speed: Option<u8>) -> Result<ResponseCode> {
        self.simple(command, &CommandArgs::new().speed(speed)).await
    }

    // Movement

    pub async fn stop(&self) -> Result<ResponseCode> {
        self.drive(Command::Stop, None).await
    }

    pub async fn forward(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::Forward, speed).await
    }

    pub async fn backward(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::Backward, speed).await
    }

    /// Strafe straight left
    pub async fn left(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::Left, speed).await
    }

    pub async fn right(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::Right, speed).await
    }

    pub async fn rotate_left(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::RotateLeft, speed).await
    }

    pub async fn rotate_right(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::RotateRight, speed).await
    }

    pub async fn diag_forward_left(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::DiagForwardLeft, speed).await
    }

    pub async fn diag_forward_right(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::DiagForwardRight, speed).await
    }

    pub async fn diag_back_left(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::DiagBackLeft, speed).await
    }

    pub async fn diag_back_right(&self, speed: Option<u8>) -> Result<ResponseCode> {
        self.drive(Command::DiagBackRight, speed).await
    }

    /// Rotate left by 20 degrees
    pub async fn rotate_left_20(&self) -> Result<ResponseCode> {
        self.drive(Command::RotateLeft20, None).await
    }

    pub async fn rotate_right_20(&self) -> Result<ResponseCode> {
        self.drive(Command::RotateRight20, None).await
    }

    pub async fn head_up(&self) -> Result<ResponseCode> {
        self.drive(Command::HeadUp, None).await
    }

    pub async fn head_down(&self) -> Result<ResponseCode> {
        self.drive(Command::HeadDown, None).await
    }

    pub async fn head_middle(&self) -> Result<ResponseCode> {
        self.drive(Command::HeadMiddle, None).await
    }

    // Status

    /// Full navigation status report
    pub async fn get_report(&self) -> Result<TelemetryReport> {
        let map = self.query(Command::GetReport, &CommandArgs::new()).await?;
        TelemetryReport::decode(&map)
    }

    /// Current navigation state
    pub async fn get_status(&self) -> Result<NavState> {
        let map = self.query(Command::GetStatus, &CommandArgs::new()).await?;
        let report = TelemetryReport::decode(&map)?;
        report.state.ok_or_else(|| {
            RovioError::MalformedResponse("GetStatus response has no state field".to_string())
        })
    }

    /// Raw MCU packet (wheel encoders, battery, IR obstacle)
    ///
    /// The `responses` field carries the hex packet, not a response code.
    pub async fn get_mcu_report(&self) -> Result<McuReport> {
        let text = self.send_text(Command::GetMcuReport, &CommandArgs::new()).await?;
        McuReport::from_response_text(&text)
    }

    /// True if the IR sensor currently sees an obstacle
    pub async fn obstacle(&self) -> Result<bool> {
        Ok(self.get_mcu_report().await?.obstacle())
    }

    pub async fn get_lib_ns_version(&self) -> Result<ResponseMap> {
        self.query(Command::GetLibNsVersion, &CommandArgs::new()).await
    }

    // Paths

    pub async fn start_recording(&self) -> Result<ResponseCode> {
        self.simple(Command::StartRecording, &CommandArgs::new()).await
    }

    /// Stop recording without saving
    pub async fn abort_recording(&self) -> Result<ResponseCode> {
        self.simple(Command::AbortRecording, &CommandArgs::new()).await
    }

    /// Stop recording and save the path under `name`
    pub async fn stop_recording(&self, name: &str) -> Result<ResponseCode> {
        self.simple(Command::StopRecording, &CommandArgs::new().arg(name)).await
    }

    pub async fn delete_path(&self, name: &str) -> Result<ResponseCode> {
        self.simple(Command::DeletePath, &CommandArgs::new().arg(name)).await
    }

    /// Stored paths, as the unparsed list text sent by the device
    pub async fn get_path_list(&self) -> Result<String> {
        self.send_text(Command::GetPathList, &CommandArgs::new()).await
    }

    pub async fn play_path_forward(&self, name: &str) -> Result<ResponseCode> {
        self.simple(Command::PlayPathForward, &CommandArgs::new().arg(name)).await
    }

    pub async fn play_path_backward(&self, name: &str) -> Result<ResponseCode> {
        self.simple(Command::PlayPathBackward, &CommandArgs::new().arg(name)).await
    }

    pub async fn stop_playing(&self) -> Result<ResponseCode> {
        self.simple(Command::StopPlaying, &CommandArgs::new()).await
    }

    pub async fn pause_playing(&self) -> Result<ResponseCode> {
        self.simple(Command::PausePlaying, &CommandArgs::new()).await
    }

    pub async fn rename_path(&self, old_name: &str, new_name: &str) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(old_name).arg(new_name);
        self.simple(Command::RenamePath, &args).await
    }

    pub async fn clear_all_paths(&self) -> Result<ResponseCode> {
        self.simple(Command::ClearAllPaths, &CommandArgs::new()).await
    }

    // Homing

    /// Drive to the home location in front of the dock
    pub async fn go_home(&self) -> Result<ResponseCode> {
        self.simple(Command::GoHome, &CommandArgs::new()).await
    }

    pub async fn go_home_and_dock(&self) -> Result<ResponseCode> {
        self.simple(Command::GoHomeAndDock, &CommandArgs::new()).await
    }

    /// Make the current position the home location
    pub async fn update_home_position(&self) -> Result<ResponseCode> {
        self.simple(Command::UpdateHomePosition, &CommandArgs::new()).await
    }

    pub async fn reset_home_location(&self) -> Result<ResponseCode> {
        self.simple(Command::ResetHomeLocation, &CommandArgs::new()).await
    }

    pub async fn reset_nav_state_machine(&self) -> Result<ResponseCode> {
        self.simple(Command::ResetNavStateMachine, &CommandArgs::new()).await
    }

    // Parameters

    pub async fn set_tuning_parameters(&self) -> Result<ResponseCode> {
        self.simple(Command::SetTuningParameters, &CommandArgs::new()).await
    }

    pub async fn get_tuning_parameters(&self) -> Result<ResponseMap> {
        self.query(Command::GetTuningParameters, &CommandArgs::new()).await
    }

    /// Store `value` in flash slot `index` (0..=19)
    pub async fn save_parameter(&self, index: u8, value: i32) -> Result<ResponseMap> {
        let args = CommandArgs::new().arg(index).arg(value);
        self.query(Command::SaveParameter, &args).await
    }

    pub async fn read_parameter(&self, index: u8) -> Result<ResponseMap> {
        self.query(Command::ReadParameter, &CommandArgs::new().arg(index)).await
    }

    // Camera

    /// Email the current image to `address`
    pub async fn email_image(&self, address: &str) -> Result<ResponseCode> {
        self.simple(Command::EmailImage, &CommandArgs::new().arg(address)).await
    }

    /// JPEG snapshot, returned untouched
    pub async fn get_image(&self, id: Option<u32>) -> Result<Vec<u8>> {
        self.send(Command::GetImage, &CommandArgs::new().opt_arg(id)).await
    }

    /// 0: 176x144, 1: 320x240, 2: 352x240, 3: 640x480
    pub async fn change_resolution(
        &self,
        res_type: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(res_type).opt_arg(redirect_url);
        self.setting(Command::ChangeResolution, &args).await
    }

    /// 0 low, 1 medium, 2 high quality
    pub async fn change_compress_ratio(
        &self,
        ratio: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(ratio).opt_arg(redirect_url);
        self.setting(Command::ChangeCompressRatio, &args).await
    }

    /// 2..=32 frames per second
    pub async fn change_framerate(
        &self,
        framerate: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(framerate).opt_arg(redirect_url);
        self.setting(Command::ChangeFramerate, &args).await
    }

    /// 0 (dimmest) ..= 6 (brightest)
    pub async fn change_brightness(
        &self,
        brightness: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(brightness).opt_arg(redirect_url);
        self.setting(Command::ChangeBrightness, &args).await
    }

    pub async fn change_speaker_volume(
        &self,
        volume: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(volume).opt_arg(redirect_url);
        self.setting(Command::ChangeSpeakerVolume, &args).await
    }

    pub async fn change_mic_volume(
        &self,
        volume: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(volume).opt_arg(redirect_url);
        self.setting(Command::ChangeMicVolume, &args).await
    }

    /// Camera sensor mains frequency: 0 auto-detect, 50 or 60 Hz
    pub async fn set_camera_frequency(
        &self,
        frequency: u8,
        redirect_url: Option<&str>,
    ) -> Result<ResponseCode> {
        let args = CommandArgs::new().arg(frequency).opt_arg(redirect_url);
        self.setting(Command::SetCamera, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use rovio_core::{HeadPosition, Resolution};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::request::RequestDescriptor;

    /// Replays canned bodies and records every request URL
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Vec<u8>>>>,
        requests: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedTransport {
        fn replying(bodies: &[&str]) -> Self {
            let transport = Self::default();
            for body in bodies {
                transport.push(Ok(body.as_bytes().to_vec()));
            }
            transport
        }

        fn push(&self, reply: Result<Vec<u8>>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.url.to_string())
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn execute(&self, request: &RequestDescriptor) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn client(bodies: &[&str]) -> DeviceClient<ScriptedTransport> {
        let config = ClientConfig::new(ConnectionSettings::new("rovio").with_credentials("a", "b"))
            .unwrap()
            .with_default_speed(2)
            .unwrap();
        DeviceClient::with_transport("karl", config, ScriptedTransport::replying(bodies))
    }

    const OK: &str = "Cmd = nav\nresponses = 0\n";

    #[tokio::test]
    async fn test_movement_returns_code() {
        let client = client(&[OK, OK]);
        assert_eq!(client.forward(Some(4)).await.unwrap(), ResponseCode::Success);
        assert_eq!(client.head_up().await.unwrap(), ResponseCode::Success);

        let urls = client.transport.urls();
        assert_eq!(urls[0], "http://rovio/rev.cgi?Cmd=nav&action=18&drive=1&speed=4");
        assert_eq!(urls[1], "http://rovio/rev.cgi?Cmd=nav&action=18&drive=11&speed=2");
    }

    #[tokio::test]
    async fn test_out_of_range_speed_uses_default() {
        let client = client(&[OK, OK]);
        client.forward(Some(15)).await.unwrap();
        client.rotate_left(Some(0)).await.unwrap();

        let urls = client.transport.urls();
        assert!(urls[0].ends_with("drive=1&speed=2"));
        assert!(urls[1].ends_with("drive=5&speed=2"));
    }

    #[tokio::test]
    async fn test_robot_busy_is_propagated() {
        let client = client(&["Cmd = nav\nresponses = 2\n"]);
        let err = client.forward(None).await.unwrap_err();

        match &err {
            RovioError::Response {
                command, code, name, ..
            } => {
                assert_eq!(*command, "Forward");
                assert_eq!(*code, 2);
                assert_eq!(*name, "ROBOT_BUSY");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_response_code_is_malformed() {
        let client = client(&["Cmd = nav\n"]);
        let err = client.go_home().await.unwrap_err();
        assert!(matches!(err, RovioError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_get_report_decodes_telemetry() {
        let client = client(&[
            "Cmd = nav\nresponses = 0\n|x=-5644|y=120|theta=314|resolution=1\
             |head_position=138|ac_freq=1|battery=104",
        ]);
        let report = client.get_report().await.unwrap();

        assert_eq!(report.x, Some(-5644));
        assert_eq!(report.resolution, Some(Resolution::R320x240));
        assert_eq!(report.head_position, Some(HeadPosition::Mid));
        assert_eq!(report.ac_freq.map(|f| f.hz()), Some(50));
        assert_eq!(report.battery, Some(rovio_core::BatteryLevel::SeekingCharge));
        assert_eq!(client.transport.urls()[0], "http://rovio/rev.cgi?Cmd=nav&action=1");
    }

    #[tokio::test]
    async fn test_get_report_failure_code() {
        let client = client(&["Cmd = nav\nresponses = 5\n|x=0"]);
        let err = client.get_report().await.unwrap_err();
        assert_eq!(err.response_code(), Some(5));
    }

    #[tokio::test]
    async fn test_get_status() {
        let client = client(&["Cmd = nav\nresponses = 0\n|state=4"]);
        assert_eq!(client.get_status().await.unwrap(), NavState::RecordingPath);
    }

    #[tokio::test]
    async fn test_mcu_report_skips_code_check() {
        let client = client(&[
            "Cmd = nav\nresponses = 0E0100000000000000000003897D54\n",
            "Cmd = nav\nresponses = 0E0100000000000000000003897D53\n",
        ]);
        let report = client.get_mcu_report().await.unwrap();
        assert_eq!(report.as_hex(), "0E0100000000000000000003897D54");
        assert!(report.obstacle());
        assert!(!client.obstacle().await.unwrap());
    }

    #[tokio::test]
    async fn test_mcu_failure_code_is_propagated() {
        let client = client(&["Cmd = nav\nresponses = 2\n", "Cmd = nav\nresponses = 18\n"]);

        let err = client.get_mcu_report().await.unwrap_err();
        assert_eq!(err.response_code(), Some(2));
        assert!(err.is_transient());

        let err = client.obstacle().await.unwrap_err();
        match err {
            RovioError::Response { code, name, .. } => {
                assert_eq!(code, 18);
                assert_eq!(name, "NO_MCU_PORT_AVAILABLE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_image_bytes_are_untouched() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x7C, 0xFF, 0xD9];
        let transport = ScriptedTransport::default();
        transport.push(Ok(jpeg.clone()));
        let config = ClientConfig::new(ConnectionSettings::new("rovio")).unwrap();
        let client = DeviceClient::with_transport("karl", config, transport);

        assert_eq!(client.get_image(Some(7)).await.unwrap(), jpeg);
        assert_eq!(client.transport.urls()[0], "http://rovio/Jpeg/CamImg7.jpg");
    }

    #[tokio::test]
    async fn test_connect_error_passes_through() {
        let transport = ScriptedTransport::default();
        transport.push(Err(RovioError::Connect {
            host: "rovio".to_string(),
            reason: "connection refused".to_string(),
        }));
        let config = ClientConfig::new(ConnectionSettings::new("rovio")).unwrap();
        let client = DeviceClient::with_transport("karl", config, transport);

        let err = client.stop().await.unwrap_err();
        assert!(matches!(err, RovioError::Connect { ref host, .. } if host == "rovio"));
    }

    #[tokio::test]
    async fn test_invalid_parameter_never_reaches_transport() {
        let client = client(&[]);
        assert!(client.read_parameter(20).await.is_err());
        assert!(client.change_framerate(40, None).await.is_err());
        assert!(client.stop_recording("my path").await.is_err());
        assert!(client.transport.urls().is_empty());
    }

    #[tokio::test]
    async fn test_path_commands() {
        let client = client(&[OK, OK, "Cmd = nav\nresponses = 9\n"]);
        client.stop_recording("kitchen").await.unwrap();
        client.rename_path("kitchen", "hall").await.unwrap();
        let err = client.play_path_forward("garage").await.unwrap_err();
        assert_eq!(err.response_code(), Some(9));

        let urls = client.transport.urls();
        assert!(urls[0].ends_with("action=4&name=kitchen"));
        assert!(urls[1].ends_with("action=11&name=kitchen&newname=hall"));
        assert!(urls[2].ends_with("action=7&name=garage"));
    }

    #[tokio::test]
    async fn test_parameters_return_map() {
        let client = client(&["Cmd = nav\nresponses = 0\n|value=1234"]);
        let map = client.read_parameter(3).await.unwrap();
        assert_eq!(map.integer("value").unwrap(), Some(1234));
        assert!(client.transport.urls()[0].ends_with("action=24&index=3"));
    }

    #[tokio::test]
    async fn test_settings_accept_empty_body() {
        let client = client(&["", "responses = 22"]);
        assert_eq!(
            client.change_brightness(3, None).await.unwrap(),
            ResponseCode::Success
        );
        let err = client.set_camera_frequency(50, None).await.unwrap_err();
        assert_eq!(err.response_code(), Some(22));

        let urls = client.transport.urls();
        assert_eq!(urls[0], "http://rovio/ChangeBrightness.cgi?Brightness=3");
        assert_eq!(urls[1], "http://rovio/SetCamera.cgi?Frequency=50");
    }

    #[tokio::test]
    async fn test_settings_redirect_page_is_success() {
        let page = "<html>\n<head><title>Rovio</title></head>\n<body>ok</body>\n</html>\n";
        let client = client(&[page]);

        let code = client.change_brightness(3, Some("/index.htm")).await.unwrap();
        assert_eq!(code, ResponseCode::Success);
        assert_eq!(
            client.transport.urls()[0],
            "http://rovio/ChangeBrightness.cgi?Brightness=3&RedirectURL=%2Findex.htm"
        );
    }

    #[tokio::test]
    async fn test_reconfigure_applies_to_next_request() {
        let mut client = client(&[OK]);
        client
            .reconfigure(ConnectionSettings::new("10.0.0.9").with_port(8080))
            .unwrap();
        client.stop().await.unwrap();

        let requests = client.transport.requests.lock().unwrap();
        assert_eq!(requests[0].host(), "10.0.0.9");
        assert!(requests[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_path_list_is_raw_text() {
        let body = "responses = 0|kitchen|hall";
        let client = client(&[body]);
        assert_eq!(client.get_path_list().await.unwrap(), body);
    }
}
