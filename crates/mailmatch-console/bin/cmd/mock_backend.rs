use clap::Args;
use eyre::Result;
use mailmatch_console::mock_backend::MockBackend;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct MockBackendArgs {
    /// Port to listen on
    #[arg(long, default_value = "6780")]
    pub port: u16,

    /// Milliseconds between generated log lines, 0 to disable
    #[arg(long, default_value = "1500")]
    pub feed_interval_ms: u64,
}

impl MockBackendArgs {
    pub fn run(&self) -> Result<()> {
        let backend = MockBackend::seeded(&format!("127.0.0.1:{}", self.port))?;
        if self.feed_interval_ms > 0 {
            backend.spawn_feed(Duration::from_millis(self.feed_interval_ms))?;
        }

        println!("Mock backend listening on {}", backend.base_url());
        println!(
            "Try: mailmatch-console --backend {} console",
            backend.base_url()
        );

        loop {
            std::thread::park();
        }
    }
}
