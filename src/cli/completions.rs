use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    system-updater completions bash > ~/.bash_completion.d/system-updater\n\n\
                  Generate zsh completions:\n    system-updater completions zsh > ~/.zfunc/_system-updater\n\n\
                  Generate fish completions:\n    system-updater completions fish > ~/.config/fish/completions/system-updater.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
