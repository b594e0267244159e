use clap::Parser;
use matchvault::cli::{Cli, Commands};
use matchvault::errors::ErrorKind;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encrypt {
            ref input_path,
            ref password,
            ref output_path,
            legacy,
        } => matchvault::cli::commands::encrypt::execute(
            input_path,
            password.as_deref(),
            output_path.as_deref(),
            legacy,
        ),
        Commands::Decrypt {
            ref input_path,
            ref password,
            ref output_path,
        } => matchvault::cli::commands::decrypt::execute(
            input_path,
            password.as_deref(),
            output_path.as_deref(),
        ),
        Commands::Pull {
            ref dir,
            ref password,
        } => matchvault::cli::commands::pull::execute(&cli, dir.as_deref(), password.as_deref()),
        Commands::Push {
            ref dir,
            ref password,
            ref message,
            legacy,
        } => matchvault::cli::commands::push::execute(
            &cli,
            dir,
            password.as_deref(),
            message.as_deref(),
            legacy,
        ),
        Commands::ChangePassword {
            ref password,
            ref new_password,
        } => matchvault::cli::commands::change_password::execute(
            &cli,
            password.as_deref(),
            new_password.as_deref(),
        ),
        Commands::Nuke {
            ref nuke_type,
            force,
            ref message,
        } => matchvault::cli::commands::nuke::execute(&cli, nuke_type, force, message.as_deref()),
        Commands::List => matchvault::cli::commands::list::execute(&cli),
        Commands::Init => matchvault::cli::commands::init::execute(),
        Commands::Completions { ref shell } => {
            matchvault::cli::commands::completions::execute(shell)
        }
    };

    if let Err(e) = result {
        matchvault::cli::output::error(&e.to_string());
        if e.kind() == ErrorKind::Crypto {
            matchvault::cli::output::tip("Please make sure you entered the correct password.");
        }
        std::process::exit(1);
    }
}
