//! Literal REST paths for the resources the provider manages.
//!
//! Route strings double as rate-limit bucket keys, so they are built in
//! one place. Query parameters are never part of a route.

/// `/guilds/{guild_id}`
pub fn guild(guild_id: &str) -> String {
    format!("/guilds/{guild_id}")
}

/// `/guilds/{guild_id}/channels`
pub fn guild_channels(guild_id: &str) -> String {
    format!("/guilds/{guild_id}/channels")
}

/// `/channels/{channel_id}`
pub fn channel(channel_id: &str) -> String {
    format!("/channels/{channel_id}")
}

/// `/channels/{channel_id}/messages`
pub fn channel_messages(channel_id: &str) -> String {
    format!("/channels/{channel_id}/messages")
}

/// `/channels/{channel_id}/messages/{message_id}`
pub fn channel_message(channel_id: &str, message_id: &str) -> String {
    format!("/channels/{channel_id}/messages/{message_id}")
}

/// `/guilds/{guild_id}/roles`
pub fn guild_roles(guild_id: &str) -> String {
    format!("/guilds/{guild_id}/roles")
}

/// `/guilds/{guild_id}/roles/{role_id}`
pub fn guild_role(guild_id: &str, role_id: &str) -> String {
    format!("/guilds/{guild_id}/roles/{role_id}")
}

/// `/guilds/{guild_id}/members/{user_id}`
pub fn guild_member(guild_id: &str, user_id: &str) -> String {
    format!("/guilds/{guild_id}/members/{user_id}")
}

/// `/guilds/{guild_id}/members/{user_id}/roles/{role_id}`
pub fn guild_member_role(guild_id: &str, user_id: &str, role_id: &str) -> String {
    format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}")
}

/// `/guilds/{guild_id}/bans/{user_id}`
pub fn guild_ban(guild_id: &str, user_id: &str) -> String {
    format!("/guilds/{guild_id}/bans/{user_id}")
}

/// `/channels/{channel_id}/invites`
pub fn channel_invites(channel_id: &str) -> String {
    format!("/channels/{channel_id}/invites")
}

/// `/invites/{invite_code}`
pub fn invite(invite_code: &str) -> String {
    format!("/invites/{invite_code}")
}

/// `/channels/{channel_id}/webhooks`
pub fn channel_webhooks(channel_id: &str) -> String {
    format!("/channels/{channel_id}/webhooks")
}

/// `/webhooks/{webhook_id}`
pub fn webhook(webhook_id: &str) -> String {
    format!("/webhooks/{webhook_id}")
}

/// `/guilds/{guild_id}/emojis/{emoji_id}`
pub fn guild_emoji(guild_id: &str, emoji_id: &str) -> String {
    format!("/guilds/{guild_id}/emojis/{emoji_id}")
}
