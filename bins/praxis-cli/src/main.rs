mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "praxis")]
#[command(about = "Praxis CLI - Run and verify courseware scripts locally", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script through the sandbox pipeline
    Run {
        /// Path to the script file
        file: String,

        /// Scripted input value (repeat the flag for multiple values)
        #[arg(short, long = "input")]
        inputs: Vec<String>,

        /// Execution deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Output cap in characters
        #[arg(long)]
        max_output: Option<usize>,

        /// Run inside this process instead of a praxis-cell child
        #[arg(long, default_value = "false")]
        inline: bool,

        /// Print the full result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Run a lesson exercise's test cases against a script
    Check {
        /// Path to the script file
        file: String,

        /// Lesson id the exercise belongs to
        #[arg(short, long)]
        lesson: String,

        /// Exercise id inside the lesson
        #[arg(short, long)]
        exercise: String,

        /// Lessons directory
        #[arg(long, default_value = "data/lessons")]
        lessons_dir: String,

        /// Require exact output matches for every case
        #[arg(long, default_value = "false")]
        strict: bool,
    },

    /// Scaffold a lessons directory with the bundled sample lessons
    InitLessons {
        /// Target directory
        #[arg(short, long, default_value = "data/lessons")]
        dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            inputs,
            timeout_ms,
            max_output,
            inline,
            json,
        } => {
            let ok = commands::run_script(&file, inputs, timeout_ms, max_output, inline, json)
                .await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Check {
            file,
            lesson,
            exercise,
            lessons_dir,
            strict,
        } => {
            let ok = commands::check_exercise(&file, &lesson, &exercise, &lessons_dir, strict)
                .await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::InitLessons { dir } => {
            commands::init_lessons(&dir)?;
        }
    }

    Ok(())
}
