use clap::Parser;
use miette::Result;
use stagecraft::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping into `head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    stagecraft::core::logging::init(global.verbose);

    match cli.command {
        Commands::Init(args) => stagecraft::cli::commands::init::run(args),
        Commands::Event(cmd) => stagecraft::cli::commands::event::run(cmd, &global),
        Commands::Wizard(cmd) => stagecraft::cli::commands::wizard::run(cmd, &global),
        Commands::Validate(args) => stagecraft::cli::commands::validate::run(args, &global),
        Commands::Import(args) => stagecraft::cli::commands::import::run(args, &global),
        Commands::Schema(args) => stagecraft::cli::commands::schema::run(args),
        Commands::Completions(args) => stagecraft::cli::commands::completions::run(args),
    }
}
