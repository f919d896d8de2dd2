use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use particle_field::{state::RunOptions, Profile, Viewport};
use std::io;

/// Animated particle background with connecting links
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Viewport width in logical pixels
  #[arg(long, default_value_t = 1280)]
  width: u32,
  /// Viewport height in logical pixels
  #[arg(long, default_value_t = 720)]
  height: u32,
  /// Use this profile instead of picking one from the viewport width
  #[arg(short, long, value_enum)]
  profile: Option<Profile>,
  /// Override the profile's particle count
  #[arg(short, long)]
  count: Option<usize>,
  /// Seed for particle placement
  #[arg(long)]
  seed: Option<u64>,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Stop a headless run after this many frame callbacks
  #[arg(long, requires = "headless")]
  frames: Option<u64>,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return Ok(());
  }

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  particle_field::state::run(RunOptions {
    viewport: Viewport::new(args.width, args.height),
    profile: args.profile,
    count: args.count,
    seed: args.seed,
    headless: args.headless,
    frames: args.frames,
  })
}
