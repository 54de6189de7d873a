// src/vocabulary.rs
//! Known command vocabulary.
//!
//! One recognized top-level program and the verbs that may follow it.
//! Sub-commands are kept sorted so membership is a binary search.

/// Immutable command vocabulary
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    top_level: &'static str,
    sub_commands: &'static [&'static str],
}

const DOCKER_SUB_COMMANDS: &[&str] = &[
    "attach", "build", "builder", "checkpoint", "commit", "compose", "config", "container",
    "context", "cp", "create", "diff", "events", "exec", "export", "history", "image", "images",
    "import", "info", "inspect", "kill", "load", "login", "logout", "logs", "network", "pause",
    "port", "ps", "pull", "push", "rename", "restart", "rm", "rmi", "run", "save", "scan",
    "search", "secret", "service", "stack", "start", "stats", "stop", "swarm", "system", "tag",
    "top", "trust", "unpause", "update", "version", "volume", "wait",
];

/// The container CLI vocabulary
pub const DOCKER: Vocabulary = Vocabulary {
    top_level: "docker",
    sub_commands: DOCKER_SUB_COMMANDS,
};

impl Vocabulary {
    pub fn top_level(&self) -> &'static str {
        self.top_level
    }

    pub fn is_top_level_command(&self, token: &str) -> bool {
        token == self.top_level
    }

    pub fn is_sub_command(&self, token: &str) -> bool {
        self.sub_commands.binary_search(&token).is_ok()
    }

    /// All sub-commands in ascending order
    pub fn sub_commands(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sub_commands.iter().copied()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        DOCKER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_commands_sorted_and_unique() {
        let subs: Vec<_> = DOCKER.sub_commands().collect();
        assert!(subs.windows(2).all(|w| w[0] < w[1]), "sub-commands must be sorted");
        assert_eq!(subs.len(), 56);
    }

    #[test]
    fn test_top_level_disjoint_from_sub_commands() {
        assert!(!DOCKER.is_sub_command(DOCKER.top_level()));
        assert!(DOCKER.sub_commands().all(|s| !DOCKER.is_top_level_command(s)));
    }

    #[test]
    fn test_membership() {
        assert!(DOCKER.is_top_level_command("docker"));
        assert!(!DOCKER.is_top_level_command("dcker"));
        assert!(DOCKER.is_sub_command("ps"));
        assert!(DOCKER.is_sub_command("compose"));
        assert!(!DOCKER.is_sub_command("pss"));
        assert!(!DOCKER.is_sub_command(""));
    }
}
