//! Long-lived collaborators shared by every command.

use std::sync::Arc;
use std::time::Duration;

use reelbot_core::job::JobKind;
use reelbot_pipeline::hosting::HostChain;
use reelbot_pipeline::media::AssetFetcher;
use reelbot_pipeline::narration::{NarrationPipeline, RequestBuilder};
use reelbot_pipeline::protocol::{JobProtocol, ProjectProtocol};
use reelbot_pipeline::runner::JobRunner;
use reelbot_pipeline::submitter::JobSubmitter;
use reelbot_pipeline::transport::ApiTransport;
use reelbot_pipeline::watcher::{JobWatcher, WatchConfig};
use reelbot_providers::fetch::HttpFetcher;
use reelbot_providers::ffmpeg::FfmpegCombiner;
use reelbot_providers::hosting::{CatboxHost, NullPointerHost};
use reelbot_providers::http::{ApiAuth, HttpTransport};
use reelbot_providers::openai::{ChatScriptWriter, OpenAiClient, SpeechClient};
use reelbot_providers::operations;

use crate::characters::CharacterLibrary;
use crate::config::{BotConfig, NarrationConfig};
use crate::discord::sink::FollowupApi;

/// Ceiling for downloaded operation footage, which is muxed locally and
/// never attached as-is.
pub const FOOTAGE_LIMIT_BYTES: u64 = 200 * 1024 * 1024;

#[derive(Clone)]
pub struct Services {
    pub runner: JobRunner,
    /// `None` when the narration stack is not configured.
    pub narration: Option<NarrationPipeline>,
    pub characters: Arc<CharacterLibrary>,
    pub hosts: HostChain,
    /// Downloads results for attaching; capped at the upload limit.
    pub fetcher: Arc<dyn AssetFetcher>,
    pub followups: Arc<dyn FollowupApi>,
    pub poll_interval: Duration,
    pub upload_limit_bytes: u64,
}

impl Services {
    /// Wire the production adapters over one pooled HTTP client.
    pub fn from_config(
        config: &BotConfig,
        client: reqwest::Client,
        followups: Arc<dyn FollowupApi>,
    ) -> Self {
        let transport: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(
            client.clone(),
            config.magic_hour_base_url.clone(),
            ApiAuth::Bearer(config.magic_hour_api_key.clone()),
        ));
        let runner = runner(transport, Arc::new(ProjectProtocol));

        let hosts = HostChain::new(vec![
            Arc::new(CatboxHost::new(client.clone())),
            Arc::new(NullPointerHost::new(client.clone())),
        ]);

        let narration = config
            .narration
            .as_ref()
            .map(|n| narration_pipeline(n, client.clone(), config.poll_interval));

        Self {
            runner,
            narration,
            characters: Arc::new(CharacterLibrary::new(&config.characters_dir, hosts.clone())),
            hosts,
            fetcher: Arc::new(HttpFetcher::new(client, config.upload_limit_bytes)),
            followups,
            poll_interval: config.poll_interval,
            upload_limit_bytes: config.upload_limit_bytes,
        }
    }

    pub fn watch_config(&self, kind: JobKind) -> WatchConfig {
        WatchConfig::for_kind(kind, self.poll_interval)
    }
}

/// Submitter and watcher sharing one transport and protocol.
pub fn runner(transport: Arc<dyn ApiTransport>, protocol: Arc<dyn JobProtocol>) -> JobRunner {
    JobRunner::new(
        JobSubmitter::new(Arc::clone(&transport), Arc::clone(&protocol)),
        JobWatcher::new(transport, protocol),
    )
}

fn narration_pipeline(
    config: &NarrationConfig,
    client: reqwest::Client,
    poll_interval: Duration,
) -> NarrationPipeline {
    let auth = ApiAuth::Header {
        name: operations::API_KEY_HEADER,
        value: config.operations_api_key.clone(),
    };
    let transport: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(
        client.clone(),
        config.operations_base_url.clone(),
        auth.clone(),
    ));
    let footage_runner = runner(
        transport,
        Arc::new(operations::protocol(&config.operations_model)),
    );

    let openai = OpenAiClient::new(
        client.clone(),
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
    );
    let request: RequestBuilder = Arc::new(operations::text_to_video);

    NarrationPipeline::new(
        Arc::new(ChatScriptWriter::new(openai.clone(), config.openai_model.clone())),
        Arc::new(SpeechClient::new(
            openai,
            config.tts_model.clone(),
            config.tts_voice.clone(),
        )),
        Arc::new(FfmpegCombiner::new(&config.ffmpeg_path)),
        Arc::new(
            HttpFetcher::new(client, FOOTAGE_LIMIT_BYTES)
                .with_auth_for(config.operations_base_url.clone(), auth),
        ),
        footage_runner,
        request,
        WatchConfig::for_kind(JobKind::LongRunningOperation, poll_interval),
    )
}
