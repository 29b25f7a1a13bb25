use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use comfy_table::Color;
use tracing::{info, warn};

use crate::config::EnvironmentProvider;
use crate::credentials::{CredentialResolver, IdentityProvider, Resolution};
use crate::errors::SetupError;
use crate::render::{auth_lines, MessageLevel, Renderer, AWS_CLI_INSTALL_URL, SECURITY_CREDENTIALS_URL};

pub const DEFAULT_SETUP_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOption {
    Sso,
    Manual,
    EnvFile,
    Skip,
}

impl SetupOption {
    pub const ALL: [SetupOption; 4] = [SetupOption::Sso, SetupOption::Manual, SetupOption::EnvFile, SetupOption::Skip];

    pub fn key(&self) -> &'static str {
        match self {
            SetupOption::Sso => "1",
            SetupOption::Manual => "2",
            SetupOption::EnvFile => "3",
            SetupOption::Skip => "4",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SetupOption::Sso => "AWS SSO (Recommended - Browser login, secure)",
            SetupOption::Manual => "AWS CLI Configuration (Manual entry)",
            SetupOption::EnvFile => "Environment Variables (.env file)",
            SetupOption::Skip => "Skip for now",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.key() == key.trim())
    }
}

/// Interactive input used by the wizard.
pub trait Prompter {
    /// Returns one of `choices`; an empty answer selects `default`.
    fn select(&mut self, prompt: &str, choices: &[&str], default: &str) -> io::Result<String>;
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> io::Result<String>;
    fn ask_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Runs an external program attached to the terminal.
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<(), SetupError>;
}

#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<(), SetupError> {
        let status = Command::new(program).args(args).status().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SetupError::CliNotFound,
            _ => SetupError::Io(e),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(SetupError::CommandFailed(status.code().unwrap_or(-1)))
        }
    }
}

/// Line-based prompts on stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }
}

impl Prompter for StdinPrompter {
    fn select(&mut self, prompt: &str, choices: &[&str], default: &str) -> io::Result<String> {
        loop {
            let answer = self.read_line(&format!("{} [{}] ({}): ", prompt, choices.join("/"), default))?;
            if answer.is_empty() {
                return Ok(default.to_string());
            }
            if choices.contains(&answer.as_str()) {
                return Ok(answer);
            }
            println!("Please select one of the available options");
        }
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            match self.read_line(&format!("{} [y/n]: ", prompt))?.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("Please enter Y or N"),
            }
        }
    }

    fn ask(&mut self, prompt: &str, default: Option<&str>) -> io::Result<String> {
        let label = match default {
            Some(d) => format!("{} ({}): ", prompt, d),
            None => format!("{}: ", prompt),
        };
        let answer = self.read_line(&label)?;
        Ok(match default {
            Some(d) if answer.is_empty() => d.to_string(),
            _ => answer,
        })
    }

    /// Terminal echo is off while the secret is typed.
    fn ask_secret(&mut self, prompt: &str) -> io::Result<String> {
        let answer = rpassword::prompt_password(format!("{}: ", prompt))?;
        Ok(answer.trim().to_string())
    }
}

/// Write a `KEY=value` credentials file readable only by the owner.
pub fn write_env_file(path: &Path, access_key: &str, secret_key: &str, region: &str) -> io::Result<()> {
    let content = format!(
        "# AWS Credentials (Automatically configured)\n\
         AWS_ACCESS_KEY_ID={}\n\
         AWS_SECRET_ACCESS_KEY={}\n\
         AWS_DEFAULT_REGION={}\n\
         \n\
         # Optional: Session token (if using temporary credentials)\n\
         # AWS_SESSION_TOKEN=your_session_token_here\n",
        access_key, secret_key, region
    );

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // mode() only applies on creation; tighten an existing file before the secret lands
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())
}

pub struct SetupWizard<'a, I, E, P, C> {
    resolver: &'a CredentialResolver<I, E>,
    prompter: P,
    runner: C,
    env_file: PathBuf,
}

impl<'a, I, E, P, C> SetupWizard<'a, I, E, P, C>
where
    I: IdentityProvider,
    E: EnvironmentProvider,
    P: Prompter,
    C: CommandRunner,
{
    pub fn new(resolver: &'a CredentialResolver<I, E>, prompter: P, runner: C, env_file: PathBuf) -> Self {
        Self {
            resolver,
            prompter,
            runner,
            env_file,
        }
    }

    /// Returns true once a working credential configuration is confirmed.
    pub async fn run<R: Renderer>(&mut self, renderer: &mut R) -> io::Result<bool> {
        renderer.panel(
            &[
                "🔐 AWS Authentication Setup".to_string(),
                "Let's configure your AWS credentials securely".to_string(),
            ],
            Color::Cyan,
        )?;
        renderer.message(MessageLevel::Info, "Checking for existing credentials...")?;

        let resolution = self.resolver.resolve().await;
        if let Resolution::Available { method, identity } = &resolution {
            renderer.message(MessageLevel::Success, &format!("✓ Found credentials using: {}", method))?;
            renderer.panel(&auth_lines(*method, Some(identity)), Color::Green)?;
            return Ok(true);
        }

        renderer.message(MessageLevel::Warning, "⚠️  No AWS credentials found")?;
        renderer.message(MessageLevel::Info, "Choose authentication method:")?;
        for option in SetupOption::ALL {
            renderer.message(MessageLevel::Hint, &format!("  {}. {}", option.key(), option.description()))?;
        }

        let keys: Vec<&str> = SetupOption::ALL.iter().map(|o| o.key()).collect();
        let choice = self.prompter.select("Select option", &keys, SetupOption::Sso.key())?;
        let option = SetupOption::from_key(&choice).unwrap_or(SetupOption::Skip);
        info!("setup option selected: {:?}", option);

        match option {
            SetupOption::Sso => {
                let intro = [
                    "AWS SSO Setup".to_string(),
                    String::new(),
                    "This will open AWS in your browser.".to_string(),
                    "Follow the prompts to authenticate securely.".to_string(),
                    "Your credentials will be saved automatically.".to_string(),
                ];
                self.run_cli_step(renderer, &intro, "Proceed with AWS SSO setup?", &["configure", "sso"])
                    .await
            }
            SetupOption::Manual => {
                let intro = [
                    "AWS CLI Manual Setup".to_string(),
                    String::new(),
                    "This will use 'aws configure' to set up your credentials.".to_string(),
                    "You'll need your AWS Access Key ID and Secret Access Key.".to_string(),
                    format!("Get your credentials: {}", SECURITY_CREDENTIALS_URL),
                ];
                self.run_cli_step(renderer, &intro, "Proceed with manual configuration?", &["configure"])
                    .await
            }
            SetupOption::EnvFile => self.setup_env_file(renderer).await,
            SetupOption::Skip => {
                renderer.message(
                    MessageLevel::Warning,
                    "Skipping setup. Configure manually later with: aws configure",
                )?;
                Ok(false)
            }
        }
    }

    async fn run_cli_step<R: Renderer>(
        &mut self,
        renderer: &mut R,
        intro: &[String],
        question: &str,
        args: &[&str],
    ) -> io::Result<bool> {
        renderer.panel(intro, Color::Cyan)?;
        if !self.prompter.confirm(question)? {
            return Ok(false);
        }

        renderer.message(MessageLevel::Info, &format!("Launching aws {}...", args.join(" ")))?;
        match self.runner.run("aws", args) {
            Ok(()) => {
                renderer.message(MessageLevel::Success, "✓ AWS credentials configured!")?;
                self.verify(renderer).await
            }
            Err(SetupError::CliNotFound) => {
                renderer.message(MessageLevel::Error, "Error: AWS CLI not found")?;
                renderer.message(MessageLevel::Hint, &format!("Install it from: {}", AWS_CLI_INSTALL_URL))?;
                Ok(false)
            }
            Err(SetupError::CommandFailed(code)) => {
                warn!("aws {} exited with {}", args.join(" "), code);
                renderer.message(MessageLevel::Error, &format!("✗ AWS configuration failed (exit code {})", code))?;
                Ok(false)
            }
            Err(SetupError::Io(e)) => {
                renderer.message(MessageLevel::Error, &format!("Error during setup: {}", e))?;
                Ok(false)
            }
        }
    }

    async fn setup_env_file<R: Renderer>(&mut self, renderer: &mut R) -> io::Result<bool> {
        renderer.panel(
            &[
                ".env File Setup".to_string(),
                String::new(),
                format!("Get your AWS credentials: {}", SECURITY_CREDENTIALS_URL),
                "Warning: keep the .env file secret and add it to .gitignore".to_string(),
            ],
            Color::Cyan,
        )?;

        let access_key = self.prompter.ask("AWS Access Key ID", None)?;
        let secret_key = self.prompter.ask_secret("AWS Secret Access Key")?;
        let region = self.prompter.ask("AWS Region", Some(DEFAULT_SETUP_REGION))?;

        if let Err(e) = write_env_file(&self.env_file, &access_key, &secret_key, &region) {
            renderer.message(MessageLevel::Error, &format!("Error writing {}: {}", self.env_file.display(), e))?;
            return Ok(false);
        }
        info!("credentials written to {}", self.env_file.display());
        renderer.message(
            MessageLevel::Success,
            &format!("✓ Credentials saved to {}", self.env_file.display()),
        )?;
        renderer.message(MessageLevel::Hint, "Make sure the file is listed in .gitignore")?;

        self.verify(renderer).await
    }

    async fn verify<R: Renderer>(&mut self, renderer: &mut R) -> io::Result<bool> {
        match self.resolver.resolve().await {
            Resolution::Available { method, .. } => {
                renderer.message(MessageLevel::Success, &format!("✓ Verified: Using {}", method))?;
                Ok(true)
            }
            Resolution::Unavailable(err) => {
                renderer.message(MessageLevel::Warning, &format!("Could not verify credentials: {}", err))?;
                Ok(false)
            }
        }
    }
}
