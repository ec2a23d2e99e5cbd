//! Dispatch: resolve, validate, execute.

use std::fmt;

use serde::Serialize;
use tactor_driver::TactorDriver;
use tactor_session::Session;
use tactor_types::config::TactorConfig;
use tactor_types::error::{Result, TactorError, UsageError};

use crate::help::{render_command, render_help};
use crate::registry::{ArgKind, CommandId, CommandRegistry, CommandSpec};
use crate::value::{Token, Value};

/// Output of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CommandOutput {
    /// Command has no result value.
    None,
    /// Number of devices found by `discover`.
    Count(i32),
    /// Id of the device opened by `connect`.
    DeviceId(i32),
    /// Device name from `getName`.
    Name(String),
    /// Result of `checkConnection`.
    Connected(bool),
    /// Rendered help.
    Text(String),
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Count(n) | Self::DeviceId(n) => write!(f, "{n}"),
            Self::Name(s) | Self::Text(s) => write!(f, "{s}"),
            Self::Connected(b) => write!(f, "{b}"),
        }
    }
}

/// Argument after validation.
#[derive(Debug, Clone, Copy)]
enum Arg<'a> {
    Int(i32),
    Mask(u32),
    Text(&'a str),
}

/// Routes commands to an owned [`Session`].
///
/// Commands arrive either as a name or as a code; both resolve to the same
/// [`CommandSpec`] and follow the same path from there on.
pub struct Dispatcher<D: TactorDriver> {
    session: Session<D>,
    registry: &'static CommandRegistry,
    config: TactorConfig,
}

impl<D: TactorDriver> Dispatcher<D> {
    /// Dispatcher with default configuration.
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, TactorConfig::default())
    }

    pub fn with_config(driver: D, config: TactorConfig) -> Self {
        Self {
            session: Session::new(driver),
            registry: CommandRegistry::global(),
            config,
        }
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<D> {
        &mut self.session
    }

    pub fn config(&self) -> &TactorConfig {
        &self.config
    }

    /// Host entry point: `inputs[0]` names the command, the rest are its
    /// arguments.
    ///
    /// No inputs renders help. The first input must be text (a command name)
    /// or an 8-bit code.
    pub fn invoke(&mut self, inputs: &[Value]) -> Result<CommandOutput> {
        let Some((first, args)) = inputs.split_first() else {
            return Ok(CommandOutput::Text(render_help()));
        };
        match first {
            Value::Text(name) => {
                let name = self.config.clip_name(name);
                self.dispatch(Token::Name(name), args)
            },
            Value::Code(code) => self.dispatch(Token::Code(*code), args),
            Value::Number(_) => {
                Err(TactorError::usage(UsageError::InvalidToken, render_help()))
            },
        }
    }

    pub fn dispatch_name(&mut self, name: &str, args: &[Value]) -> Result<CommandOutput> {
        self.dispatch(Token::Name(name), args)
    }

    pub fn dispatch_code(&mut self, code: u8, args: &[Value]) -> Result<CommandOutput> {
        self.dispatch(Token::Code(code), args)
    }

    /// Resolve `token`, validate `args`, and run the command.
    ///
    /// Usage errors are reported before any driver call.
    pub fn dispatch(&mut self, token: Token<'_>, args: &[Value]) -> Result<CommandOutput> {
        let spec = self.registry.resolve(token).ok_or_else(|| {
            log::debug!("Unresolved command {token}");
            TactorError::usage(UsageError::UnknownCommand(token.to_string()), render_help())
        })?;
        log::debug!(
            "dispatch {} (code {}) with {} arg(s)",
            spec.name,
            spec.code(),
            args.len()
        );

        spec.validate(args)
            .map_err(|message| bad_arguments(spec, message))?;
        let parsed = convert(spec, args);
        self.execute(spec, &parsed)
    }

    fn execute(&mut self, spec: &'static CommandSpec, args: &[Arg<'_>]) -> Result<CommandOutput> {
        use Arg::{Int, Mask, Text};

        let s = &mut self.session;
        let none = |r: Result<()>| r.map(|()| CommandOutput::None);
        match (spec.id, args) {
            (CommandId::Initialize, _) => none(s.initialize()),
            (CommandId::Shutdown, _) => none(s.shutdown()),
            (CommandId::Discover, [Int(kind), ..]) => {
                s.discover(*kind).map(CommandOutput::Count)
            },
            (CommandId::GetName, [Int(index), ..]) => {
                s.device_name(*index).map(CommandOutput::Name)
            },
            (CommandId::Connect, [Text(name), Int(kind), ..]) => {
                let name = self.config.clip_name(name);
                s.connect(name, *kind).map(CommandOutput::DeviceId)
            },
            (CommandId::CheckConnection, _) => Ok(CommandOutput::Connected(s.is_connected())),
            (CommandId::Close, [Int(dev), ..]) => none(s.close(*dev)),
            (CommandId::SetTimeFactor, [Int(value), ..]) => none(s.set_time_factor(*value)),
            (CommandId::Pulse, [Int(dev), Int(tac), Int(dur), Int(delay), ..]) => {
                none(s.pulse(*dev, *tac, *dur, *delay))
            },
            (CommandId::ChangeGain, [Int(dev), Int(tac), Int(gain), Int(delay), ..]) => {
                none(s.change_gain(*dev, *tac, *gain, *delay))
            },
            (CommandId::ChangeFreq, [Int(dev), Int(tac), Int(freq), Int(delay), ..]) => {
                none(s.change_freq(*dev, *tac, *freq, *delay))
            },
            (
                CommandId::RampGain,
                [Int(dev), Int(tac), Int(start), Int(end), Int(dur), Int(delay), ..],
            ) => none(s.ramp_gain(*dev, *tac, *start, *end, *dur, *delay)),
            (
                CommandId::RampFreq,
                [Int(dev), Int(tac), Int(start), Int(end), Int(dur), Int(delay), ..],
            ) => none(s.ramp_freq(*dev, *tac, *start, *end, *dur, *delay)),
            (CommandId::Stop, [Int(dev)]) => none(s.stop(*dev, 0)),
            (CommandId::Stop, [Int(dev), Int(delay), ..]) => none(s.stop(*dev, *delay)),
            (CommandId::SetState, [Int(dev), Mask(mask)]) => {
                none(s.set_state(*dev, *mask, 0))
            },
            (CommandId::SetState, [Int(dev), Mask(mask), Int(delay), ..]) => {
                none(s.set_state(*dev, *mask, *delay))
            },
            (CommandId::BeginStoreTAction, [Int(dev), Int(tac_id), ..]) => {
                none(s.begin_store_taction(*dev, *tac_id))
            },
            (CommandId::FinishStoreTAction, [Int(dev), ..]) => {
                none(s.finish_store_taction(*dev))
            },
            (CommandId::PlayStoredTAction, [Int(dev), Int(tac_id)]) => {
                none(s.play_stored_taction(*dev, *tac_id, 0))
            },
            (CommandId::PlayStoredTAction, [Int(dev), Int(tac_id), Int(delay), ..]) => {
                none(s.play_stored_taction(*dev, *tac_id, *delay))
            },
            (CommandId::Help, []) => Ok(CommandOutput::Text(render_help())),
            (CommandId::Help, [topic, ..]) => help_topic(self.registry, *topic),
            _ => Err(bad_arguments(spec, spec.requires.to_string())),
        }
    }
}

impl<D: TactorDriver> fmt::Debug for Dispatcher<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// `help <command>`: usage for one command, resolved like any other token.
fn help_topic(registry: &CommandRegistry, topic: Arg<'_>) -> Result<CommandOutput> {
    let token = match topic {
        Arg::Text(name) => Token::Name(name),
        Arg::Int(code) => Token::Code(u8::try_from(code).unwrap_or(0)),
        Arg::Mask(code) => Token::Code(u8::try_from(code).unwrap_or(0)),
    };
    let spec = registry.resolve(token).ok_or_else(|| {
        TactorError::usage(UsageError::UnknownCommand(token.to_string()), render_help())
    })?;
    Ok(CommandOutput::Text(render_command(spec)))
}

fn bad_arguments(spec: &'static CommandSpec, message: String) -> TactorError {
    TactorError::usage(
        UsageError::BadArguments {
            command: spec.name,
            message,
        },
        render_command(spec),
    )
}

/// Convert host values that `spec` has already validated. Arguments beyond
/// the declared ones are dropped.
fn convert<'a>(spec: &CommandSpec, args: &'a [Value]) -> Vec<Arg<'a>> {
    spec.args
        .iter()
        .zip(args)
        .filter_map(|(arg, value)| match (arg.kind, value) {
            (_, Value::Text(s)) => Some(Arg::Text(s)),
            (ArgKind::Mask, v) => v.as_u32().map(Arg::Mask),
            (_, v) => v.as_i32().map(Arg::Int),
        })
        .collect()
}
