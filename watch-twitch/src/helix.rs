//! Folding the three Helix records of a channel into a single [`ChannelInfo`].
use twitch_api2::{
    helix::{channels::ChannelInformation, streams::Stream, users::User},
    types::Nickname,
};
use watch_core::channel::ChannelInfo;

pub(crate) fn same_login(login: &Nickname, channel: &str) -> bool {
    login.as_str().eq_ignore_ascii_case(channel)
}

/// `stream` is the live record, if any. `channel` is the metadata record
/// matching the user, if the lookup returned one.
pub fn channel_info(
    user: User,
    stream: Option<Stream>,
    channel: Option<ChannelInformation>,
) -> ChannelInfo {
    let live = stream.filter(|s| s.type_.is_live());
    let is_live = live.is_some();

    let (game_name, stream_title) = match (channel, &live) {
        (Some(channel), _) => (Some(channel.game_name.to_string()), Some(channel.title)),
        (None, Some(stream)) => (
            Some(stream.game_name.to_string()),
            Some(stream.title.clone()),
        ),
        (None, None) => (None, None),
    };

    let (viewer_count, is_mature, started_at) = match live {
        Some(stream) => (
            stream.viewer_count as u64,
            Some(stream.is_mature),
            Some(stream.started_at.to_string()),
        ),
        None => (0, None, None),
    };

    ChannelInfo {
        display_name: user.display_name.to_string(),
        is_live,
        profile_image_url: user.profile_image_url.filter(|url| !url.is_empty()),
        viewer_count,
        game_name,
        stream_title,
        is_mature,
        started_at,
    }
}
