//! Static command table and name/code resolution.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::value::{Token, Value};

/// Internal command identifier. The discriminant is the command's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    Initialize = 1,
    Shutdown = 2,
    Discover = 3,
    Connect = 4,
    Pulse = 5,
    ChangeGain = 6,
    GetName = 7,
    CheckConnection = 8,
    ChangeFreq = 9,
    RampGain = 10,
    RampFreq = 11,
    SetTimeFactor = 12,
    Stop = 13,
    SetState = 14,
    BeginStoreTAction = 15,
    FinishStoreTAction = 16,
    PlayStoredTAction = 17,
    Help = 18,
    Close = 19,
}

impl CommandId {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// What kind of host value an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Numeric; converted to an integer.
    Number,
    /// Character data.
    Text,
    /// Either a command name or a command code.
    Command,
    /// Bitmask; a non-negative integer that fits in 32 bits.
    Mask,
}

/// One positional argument.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    /// Inclusive bounds checked before the driver is called.
    pub range: Option<(i32, i32)>,
}

impl ArgSpec {
    const fn num(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Number,
            range: None,
        }
    }

    const fn ranged(name: &'static str, lo: i32, hi: i32) -> Self {
        Self {
            name,
            kind: ArgKind::Number,
            range: Some((lo, hi)),
        }
    }

    const fn mask(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Mask,
            range: None,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Text,
            range: None,
        }
    }

    /// Check one host value against this argument.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self.kind {
            ArgKind::Text if value.as_text().is_none() => {
                Err(format!("{} must be a string", self.name))
            },
            ArgKind::Number => {
                let n = value.as_i32().ok_or_else(|| self.not_numeric(value, "an integer"))?;
                match self.range {
                    Some((lo, hi)) if !(lo..=hi).contains(&n) => Err(format!(
                        "{} must be between {lo} and {hi}, got {n}",
                        self.name
                    )),
                    _ => Ok(()),
                }
            },
            ArgKind::Mask => value
                .as_u32()
                .map(drop)
                .ok_or_else(|| self.not_numeric(value, "a non-negative 32-bit integer")),
            ArgKind::Command if value.as_text().is_none() && value.as_i32().is_none() => {
                Err(format!("{} must be a command name or code", self.name))
            },
            _ => Ok(()),
        }
    }

    fn not_numeric(&self, value: &Value, expected: &str) -> String {
        if value.is_numeric() {
            format!("{} must be {expected}, got {value}", self.name)
        } else {
            format!("{} must be numeric", self.name)
        }
    }
}

/// Static description of one command.
#[derive(Debug)]
pub struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    /// Synonyms that resolve to this same spec.
    pub aliases: &'static [&'static str],
    /// Positional arguments; the first `min_args` are required.
    pub args: &'static [ArgSpec],
    pub min_args: usize,
    pub description: &'static str,
    /// Message shown when required arguments are missing.
    pub requires: &'static str,
}

impl CommandSpec {
    pub fn code(&self) -> u8 {
        self.id.code()
    }

    /// Check argument count, kinds, and ranges. Extra arguments are ignored.
    pub fn validate(&self, args: &[Value]) -> Result<(), String> {
        if args.len() < self.min_args {
            return Err(self.requires.to_string());
        }
        for (spec, value) in self.args.iter().zip(args) {
            spec.check(value)?;
        }
        Ok(())
    }

    /// `name <arg> ... [optional]`, as shown in help.
    pub fn usage(&self) -> String {
        let mut out = self.name.to_string();
        for (i, arg) in self.args.iter().enumerate() {
            if i < self.min_args {
                out.push_str(&format!(" <{}>", arg.name));
            } else {
                out.push_str(&format!(" [{}]", arg.name));
            }
        }
        out
    }
}

const DEVICE: ArgSpec = ArgSpec::num("deviceID");
const TACTOR: ArgSpec = ArgSpec::num("tactor");
const DELAY: ArgSpec = ArgSpec::num("delay");
const DURATION: ArgSpec = ArgSpec::num("duration");
const FREQ_MIN: i32 = 300;
const FREQ_MAX: i32 = 3550;

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        id: CommandId::Initialize,
        name: "initialize",
        aliases: &[],
        args: &[],
        min_args: 0,
        description: "Initialize the tactor interface.",
        requires: "",
    },
    CommandSpec {
        id: CommandId::Shutdown,
        name: "shutdown",
        aliases: &[],
        args: &[],
        min_args: 0,
        description: "Shutdown the tactor interface and clean up resources.",
        requires: "",
    },
    CommandSpec {
        id: CommandId::Discover,
        name: "discover",
        aliases: &[],
        args: &[ArgSpec::num("type")],
        min_args: 1,
        description: "Discover devices of the specified type (e.g., USB = 1).",
        requires: "Discover requires a device type as an argument.",
    },
    CommandSpec {
        id: CommandId::Connect,
        name: "connect",
        aliases: &[],
        args: &[ArgSpec::text("name"), ArgSpec::num("type")],
        min_args: 2,
        description: "Connect to a device with the given name and type.",
        requires: "Connect requires a device name (string) and type (integer).",
    },
    CommandSpec {
        id: CommandId::Pulse,
        name: "pulse",
        aliases: &[],
        args: &[DEVICE, TACTOR, DURATION, DELAY],
        min_args: 4,
        description: "Pulse a tactor for the specified duration and delay.",
        requires: "Pulse requires deviceID, tactor number, duration, and delay.",
    },
    CommandSpec {
        id: CommandId::ChangeGain,
        name: "changeGain",
        aliases: &[],
        args: &[DEVICE, TACTOR, ArgSpec::num("gain"), DELAY],
        min_args: 4,
        description: "Change the gain of a tactor.",
        requires: "ChangeGain requires deviceID, tactor number, gain value, and delay.",
    },
    CommandSpec {
        id: CommandId::GetName,
        name: "getName",
        aliases: &[],
        args: &[ArgSpec::num("index")],
        min_args: 1,
        description: "Get the name of a device from the (0-indexed) discovered device list.",
        requires: "getName requires an index.",
    },
    CommandSpec {
        id: CommandId::CheckConnection,
        name: "checkConnection",
        aliases: &[],
        args: &[],
        min_args: 0,
        description: "Report whether a device is currently connected.",
        requires: "",
    },
    CommandSpec {
        id: CommandId::ChangeFreq,
        name: "changeFreq",
        aliases: &[],
        args: &[
            DEVICE,
            TACTOR,
            ArgSpec::ranged("freq", FREQ_MIN, FREQ_MAX),
            DELAY,
        ],
        min_args: 4,
        description: "Change the frequency of a tactor (300-3550 Hz).",
        requires: "ChangeFreq requires deviceID, tactor number, frequency, and delay.",
    },
    CommandSpec {
        id: CommandId::RampGain,
        name: "rampGain",
        aliases: &[],
        args: &[
            DEVICE,
            TACTOR,
            ArgSpec::num("startGain"),
            ArgSpec::num("endGain"),
            DURATION,
            DELAY,
        ],
        min_args: 6,
        description: "Ramp the gain of a tactor over a duration.",
        requires: "RampGain requires deviceID, tactor number, start gain, end gain, duration, and delay.",
    },
    CommandSpec {
        id: CommandId::RampFreq,
        name: "rampFreq",
        aliases: &[],
        args: &[
            DEVICE,
            TACTOR,
            ArgSpec::ranged("startFreq", FREQ_MIN, FREQ_MAX),
            ArgSpec::ranged("endFreq", FREQ_MIN, FREQ_MAX),
            DURATION,
            DELAY,
        ],
        min_args: 6,
        description: "Ramp the frequency of a tactor over a duration.",
        requires: "RampFreq requires deviceID, tactor number, start frequency, end frequency, duration, and delay.",
    },
    CommandSpec {
        id: CommandId::SetTimeFactor,
        name: "setTimeFactor",
        aliases: &[],
        args: &[ArgSpec::ranged("value", 1, 255)],
        min_args: 1,
        description: "Set the time factor applied to durations (1-255).",
        requires: "SetTimeFactor requires a value between 1 and 255.",
    },
    CommandSpec {
        id: CommandId::Stop,
        name: "stop",
        aliases: &[],
        args: &[DEVICE, DELAY],
        min_args: 1,
        description: "Stop all tactors on a device.",
        requires: "Stop requires a deviceID.",
    },
    CommandSpec {
        id: CommandId::SetState,
        name: "setState",
        aliases: &[],
        args: &[DEVICE, ArgSpec::mask("states"), DELAY],
        min_args: 2,
        description: "Switch tactors on/off from a bitmask (bit 0 = tactor 1).",
        requires: "SetState requires deviceID and a tactor state bitmask.",
    },
    CommandSpec {
        id: CommandId::BeginStoreTAction,
        name: "beginStoreTAction",
        aliases: &[],
        args: &[DEVICE, ArgSpec::num("tacID")],
        min_args: 2,
        description: "Start recording actions into a stored TAction slot.",
        requires: "BeginStoreTAction requires deviceID and a TAction id.",
    },
    CommandSpec {
        id: CommandId::FinishStoreTAction,
        name: "finishStoreTAction",
        aliases: &[],
        args: &[DEVICE],
        min_args: 1,
        description: "Finish recording the current TAction.",
        requires: "FinishStoreTAction requires a deviceID.",
    },
    CommandSpec {
        id: CommandId::PlayStoredTAction,
        name: "playStoredTAction",
        aliases: &[],
        args: &[DEVICE, ArgSpec::num("tacID"), DELAY],
        min_args: 2,
        description: "Play a stored TAction.",
        requires: "PlayStoredTAction requires deviceID and a TAction id.",
    },
    CommandSpec {
        id: CommandId::Help,
        name: "help",
        aliases: &["h", "list", "l"],
        args: &[ArgSpec {
            name: "command",
            kind: ArgKind::Command,
            range: None,
        }],
        min_args: 0,
        description: "Show this help, or usage for one command.",
        requires: "",
    },
    CommandSpec {
        id: CommandId::Close,
        name: "close",
        aliases: &[],
        args: &[DEVICE],
        min_args: 1,
        description: "Close a connected device.",
        requires: "Close requires a deviceID.",
    },
];

/// Lookup structure over the static command table.
///
/// Built once on first use and never modified afterwards.
pub struct CommandRegistry {
    by_name: HashMap<&'static str, &'static CommandSpec>,
    by_code: HashMap<u8, &'static CommandSpec>,
}

static REGISTRY: LazyLock<CommandRegistry> = LazyLock::new(|| CommandRegistry::build(COMMANDS));

impl CommandRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    fn build(table: &'static [CommandSpec]) -> Self {
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();
        for spec in table {
            by_code.insert(spec.code(), spec);
            by_name.insert(spec.name, spec);
            for alias in spec.aliases {
                by_name.insert(*alias, spec);
            }
        }
        Self { by_name, by_code }
    }

    /// Resolve a name (case-sensitive) or code. Code 0 never resolves.
    pub fn resolve(&self, token: Token<'_>) -> Option<&'static CommandSpec> {
        match token {
            Token::Name(name) => self.by_name.get(name).copied(),
            Token::Code(0) => None,
            Token::Code(code) => self.by_code.get(&code).copied(),
        }
    }

    pub fn get(&self, id: CommandId) -> &'static CommandSpec {
        // Every CommandId has exactly one table row.
        self.by_code[&id.code()]
    }

    /// Every command in code order.
    pub fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }
}
