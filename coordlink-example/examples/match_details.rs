//! Match details example.
//!
//! Logs on against a scripted in-memory peer, enters the application session
//! and fetches the details of one match.
//!
//! Environment overrides: `COORDLINK_USER`, `COORDLINK_PASSWORD`,
//! `COORDLINK_MATCH_ID`.

use anyhow::Context;
use bytes::Bytes;
use coordlink::engine::DECLARE_ACTIVE;
use coordlink::prelude::*;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const APP_ID: AppId = AppId::new(570);
const MATCH_DETAILS_REQUEST: TypeCode = TypeCode::new(7095);
const MATCH_DETAILS_RESPONSE: TypeCode = TypeCode::new(7096);
const DEFAULT_MATCH_ID: u64 = 834391254;

#[derive(Debug, Default)]
struct MatchDetailsRequest {
    match_id: u64,
}

impl CoordinatorMessage for MatchDetailsRequest {
    const KIND: &'static str = "MatchDetailsRequest";

    fn encode(&self) -> Bytes {
        let mut writer = BodyWriter::new();
        writer.put_u64(self.match_id);
        writer.finish()
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        let mut reader = BodyReader::new(bytes);
        Ok(Self {
            match_id: reader.u64()?,
        })
    }
}

#[derive(Debug, Default)]
struct MatchDetailsResponse {
    result: u32,
    match_id: u64,
    duration: u32,
    game_mode: u32,
    radiant_win: bool,
    cluster: String,
}

impl CoordinatorMessage for MatchDetailsResponse {
    const KIND: &'static str = "MatchDetailsResponse";

    fn encode(&self) -> Bytes {
        let mut writer = BodyWriter::new();
        writer
            .put_u32(self.result)
            .put_u64(self.match_id)
            .put_u32(self.duration)
            .put_u32(self.game_mode)
            .put_bool(self.radiant_win)
            .put_str(&self.cluster);
        writer.finish()
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        let mut reader = BodyReader::new(bytes);
        Ok(Self {
            result: reader.u32()?,
            match_id: reader.u64()?,
            duration: reader.u32()?,
            game_mode: reader.u32()?,
            radiant_win: reader.bool("radiant_win")?,
            cluster: reader.string()?,
        })
    }
}

/// Initializes logging for examples.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// A peer that accepts the session and answers match-details requests.
fn scripted_peer() -> MemoryTransport {
    MemoryTransport::new().with_responder(|call| match call {
        TransportCall::Connect => vec![TransportEvent::Connected(ResultCode::Ok)],
        TransportCall::LogOn(_) => vec![
            TransportEvent::LoggedOn(ResultCode::Ok),
            TransportEvent::AccountInfo,
        ],
        TransportCall::Send(message) if message.type_code == DECLARE_ACTIVE => {
            vec![TransportEvent::PlayingSessionState {
                playing_blocked: false,
                app_id: APP_ID,
            }]
        }
        TransportCall::Send(message) if message.type_code == MATCH_DETAILS_REQUEST => {
            let Ok(request) = MatchDetailsRequest::decode(&message.payload) else {
                return Vec::new();
            };
            let response = MatchDetailsResponse {
                result: 1,
                match_id: request.match_id,
                duration: 2417,
                game_mode: 22,
                radiant_win: true,
                cluster: "eu-west".to_string(),
            };
            vec![TransportEvent::Message(InboundMessage::new(
                MATCH_DETAILS_RESPONSE,
                message.correlation_id,
                response.encode(),
            ))]
        }
        _ => Vec::new(),
    })
}

fn print_match_details(details: &MatchDetailsResponse) {
    println!("cluster: {}", details.cluster);
    println!("duration: {}", details.duration);
    println!("game_mode: {}", details.game_mode);
    println!("match_id: {}", details.match_id);
    println!("radiant_win: {}", details.radiant_win);
    println!("result: {}", details.result);
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let username = env::var("COORDLINK_USER").unwrap_or_else(|_| "demo".to_string());
    let password = env::var("COORDLINK_PASSWORD").unwrap_or_else(|_| "demo".to_string());
    let match_id = env::var("COORDLINK_MATCH_ID")
        .ok()
        .and_then(|id| id.parse().ok())
        .unwrap_or(DEFAULT_MATCH_ID);

    let transport = Arc::new(scripted_peer());
    let credentials = Arc::new(StaticCredentials::new(Credential::new(username, password)));
    let controller = SessionController::new(
        transport,
        credentials,
        ControllerConfig::new().with_show_as_online(true),
    )?;

    let kinds = KindRegistry::new()
        .with::<MatchDetailsRequest>(MATCH_DETAILS_REQUEST)
        .with::<MatchDetailsResponse>(MATCH_DETAILS_RESPONSE);
    let bridge = MessageBridge::new(controller.dispatcher(), kinds, BridgeConfig::new(APP_ID))?;

    controller.start()?;
    if !controller.wait_ready_timeout(Duration::from_secs(10)) {
        anyhow::bail!(
            "session not ready: {}",
            controller
                .abort_reason()
                .map_or_else(|| controller.state().to_string(), |r| r.to_string())
        );
    }
    info!("session ready");

    if !bridge.enter_session() {
        warn!(app_id = %APP_ID, "application session not confirmed");
    }

    let details: MatchDetailsResponse = bridge
        .send_request(|req: &mut MatchDetailsRequest| req.match_id = match_id)
        .with_context(|| format!("fetching match {match_id}"))?;
    print_match_details(&details);

    controller.stop()?;
    Ok(())
}
