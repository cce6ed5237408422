const ROUTE_PREFIX: &str = "route ";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command")]
    Unknown,

    #[error("Use: route <from> <to>")]
    Usage,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RouteCommand {
    pub origin: String,
    pub destination: String,
}

impl std::str::FromStr for RouteCommand {
    type Err = CommandError;

    /// expects an already trimmed command line
    fn from_str(command: &str) -> Result<Self, Self::Err> {
        if !command.starts_with(ROUTE_PREFIX) {
            return Err(CommandError::Unknown);
        }

        let parts = command.split_whitespace().collect::<Vec<_>>();
        match parts[..] {
            [_, origin, destination] => Ok(Self {
                origin: origin.to_owned(),
                destination: destination.to_owned(),
            }),
            _ => Err(CommandError::Usage),
        }
    }
}
