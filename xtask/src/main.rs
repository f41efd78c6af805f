use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for rtgl")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the bundled demo manifest headlessly
    Demo {
        /// Manifest to run
        #[arg(default_value = "demos/basic/demo.yaml")]
        manifest: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for task in [Task::Fmt, Task::Clippy, Task::Test, Task::Doc] {
                task.run()?;
            }
        }
        Commands::Fmt => Task::Fmt.run()?,
        Commands::Clippy => Task::Clippy.run()?,
        Commands::Test => Task::Test.run()?,
        Commands::Doc => Task::Doc.run()?,
        Commands::Build => Task::Build.run()?,
        Commands::Demo { manifest } => {
            cargo(
                "cargo run -p rtgl-cli",
                &["run", "-p", "rtgl-cli", "--", "run", &manifest],
            )?;
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Task {
    Fmt,
    Clippy,
    Test,
    Doc,
    Build,
}

impl Task {
    fn run(self) -> Result<()> {
        match self {
            Task::Fmt => cargo("cargo fmt --check", &["fmt", "--all", "--", "--check"]),
            Task::Clippy => cargo(
                "cargo clippy",
                &[
                    "clippy",
                    "--workspace",
                    "--all-targets",
                    "--",
                    "-D",
                    "warnings",
                ],
            ),
            Task::Test => cargo("cargo test", &["test", "--workspace"]),
            Task::Doc => cargo("cargo doc", &["doc", "--workspace", "--no-deps"]),
            Task::Build => cargo("cargo build", &["build", "--workspace"]),
        }
    }
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}
