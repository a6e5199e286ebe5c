//! The user-facing command surface.

/// A recognized relay command. Anything else arriving with the command
/// prefix is silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request (or reciprocate) a binding to another channel.
    Bind { target: String },
    /// Tear down the issuing channel's connection.
    Unbind,
    /// Delete recent messages in the issuing channel.
    Clear,
    /// Delete recent messages in the paired channel.
    ClearOther,
    /// Suppress forwarding into the issuing channel.
    Lock,
    /// Resume forwarding into the issuing channel.
    Unlock,
    /// Replay messages deferred while the issuing channel was locked.
    Pull,
}

impl Command {
    /// Parse a message body into a command. Returns `None` for messages
    /// without the prefix, unknown commands, and `bind` without a target.
    pub fn parse(content: &str, prefix: &str) -> Option<Self> {
        let rest = content.strip_prefix(prefix)?;
        let mut parts = rest.splitn(2, ' ');
        let name = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next().unwrap_or_default().trim();
        match name.as_str() {
            "bind" if !argument.is_empty() => Some(Self::Bind {
                target: argument.to_string(),
            }),
            "unbind" => Some(Self::Unbind),
            "clear" | "clean" | "wipe" | "nuke" => Some(Self::Clear),
            "clearother" => Some(Self::ClearOther),
            "lock" => Some(Self::Lock),
            "unlock" => Some(Self::Unlock),
            "pull" => Some(Self::Pull),
            _ => None,
        }
    }

    /// Command name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "bind",
            Self::Unbind => "unbind",
            Self::Clear => "clear",
            Self::ClearOther => "clearother",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Pull => "pull",
        }
    }
}
