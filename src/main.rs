use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{hooks, plan, run, tasks};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(version = VERSION)]
#[command(about = "Resolve deployment tasks and their hooks for a connection and stage")]
struct Cli {
    /// Configuration file (default: launchpad.{yml,yaml,json,toml} in the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    /// Connection to target instead of the configured default
    #[arg(long = "on", global = true, value_name = "CONNECTION")]
    on: Option<String>,

    /// Stage to activate
    #[arg(long, global = true)]
    stage: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered tasks
    Tasks(tasks::TasksArgs),
    /// Show the resolved listeners of a task phase
    Hooks(hooks::HooksArgs),
    /// Show the commands tasks would run, with their hooks
    Plan(plan::PlanArgs),
    /// Run a task with its hooks
    Run(run::RunArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config: cli.config,
        connection: cli.on,
        stage: cli.stage,
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
