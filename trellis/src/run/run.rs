//! Transient handle for one agent-chain invocation.

use uuid::Uuid;

/// Identifies one run of an agent chain. Terminal once the chain has yielded
/// its final message.
#[derive(Clone, Debug)]
pub struct Run {
    run_id: String,
    terminal: bool,
}

impl Run {
    pub fn new(run_id_base: &str) -> Self {
        Self {
            run_id: format!("run-{run_id_base}"),
            terminal: false,
        }
    }

    pub fn fresh() -> Self {
        Self::new(&Uuid::new_v4().to_string())
    }

    pub fn id(&self) -> &str {
        &self.run_id
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn into_terminal(mut self) -> Self {
        self.terminal = true;
        self
    }
}
