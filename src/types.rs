// src/types.rs

use std::fmt;
use std::str::FromStr;

/// Namespace accepted in front of a hook name, e.g. `runasd::hooks::StopHook`.
pub const HOOK_NAMESPACE: &str = "runasd::hooks";

/// The closed set of recovery policies that can be listed in `exitHooks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Stop,
    Restart,
    EmailNotify,
}

/// Configured name -> variant lookup table. Names are case-sensitive.
const HOOK_NAMES: &[(&str, HookKind)] = &[
    ("StopHook", HookKind::Stop),
    ("RestartHook", HookKind::Restart),
    ("EmailNotifyHook", HookKind::EmailNotify),
    ("EmailSenderHook", HookKind::EmailNotify),
];

impl HookKind {
    /// Canonical configuration name of the variant.
    pub fn name(self) -> &'static str {
        match self {
            HookKind::Stop => "StopHook",
            HookKind::Restart => "RestartHook",
            HookKind::EmailNotify => "EmailNotifyHook",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let short = strip_namespace(name).ok_or_else(|| format!("unknown hook namespace: {name}"))?;

        HOOK_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == short)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| format!("unknown hook: {name}"))
    }
}

/// Strip an optional `runasd::hooks::` / `runasd.hooks.` qualification.
///
/// Returns `None` when the name is qualified with any other namespace.
fn strip_namespace(name: &str) -> Option<&str> {
    let dotted = HOOK_NAMESPACE.replace("::", ".");

    if let Some(rest) = name.strip_prefix(HOOK_NAMESPACE).and_then(|r| r.strip_prefix("::")) {
        return Some(rest);
    }
    if let Some(rest) = name.strip_prefix(dotted.as_str()).and_then(|r| r.strip_prefix('.')) {
        return Some(rest);
    }
    if name.contains("::") || name.contains('.') {
        return None;
    }
    Some(name)
}

/// How many more times the restart policy may relaunch the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartBudget {
    /// No `restart/times` configured.
    Unlimited,
    Remaining(u32),
}

impl Default for RestartBudget {
    fn default() -> Self {
        RestartBudget::Unlimited
    }
}

impl RestartBudget {
    pub fn is_exhausted(self) -> bool {
        matches!(self, RestartBudget::Remaining(0))
    }

    /// Consume one restart. Unlimited budgets never change.
    pub fn consume(self) -> Self {
        match self {
            RestartBudget::Unlimited => RestartBudget::Unlimited,
            RestartBudget::Remaining(n) => RestartBudget::Remaining(n.saturating_sub(1)),
        }
    }
}

impl fmt::Display for RestartBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartBudget::Unlimited => f.write_str("unlimited"),
            RestartBudget::Remaining(n) => write!(f, "{n}"),
        }
    }
}
