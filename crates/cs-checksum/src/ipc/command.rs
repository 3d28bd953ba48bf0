//! Command codes and typed command decoding.

use crate::domain::{EntryRef, ResourceState, ResourceType};
use crate::error::{CsError, CsResult};
use serde::{Deserialize, Serialize};

/// Command codes carried by command messages.
pub mod codes {
    pub const NOOP: u16 = 0;
    pub const RESET: u16 = 1;
    pub const ONE_SHOT: u16 = 2;
    pub const CANCEL_ONE_SHOT: u16 = 3;
    pub const ENABLE_ALL: u16 = 4;
    pub const DISABLE_ALL: u16 = 5;

    pub const ENABLE_CFE_CORE: u16 = 6;
    pub const DISABLE_CFE_CORE: u16 = 7;
    pub const REPORT_BASELINE_CFE_CORE: u16 = 8;
    pub const RECOMPUTE_BASELINE_CFE_CORE: u16 = 9;

    pub const ENABLE_OS: u16 = 10;
    pub const DISABLE_OS: u16 = 11;
    pub const REPORT_BASELINE_OS: u16 = 12;
    pub const RECOMPUTE_BASELINE_OS: u16 = 13;

    pub const ENABLE_EEPROM: u16 = 14;
    pub const DISABLE_EEPROM: u16 = 15;
    pub const REPORT_BASELINE_EEPROM: u16 = 16;
    pub const RECOMPUTE_BASELINE_EEPROM: u16 = 17;
    pub const ENABLE_ENTRY_EEPROM: u16 = 18;
    pub const DISABLE_ENTRY_EEPROM: u16 = 19;
    pub const GET_ENTRY_ID_EEPROM: u16 = 20;

    pub const ENABLE_MEMORY: u16 = 21;
    pub const DISABLE_MEMORY: u16 = 22;
    pub const REPORT_BASELINE_MEMORY: u16 = 23;
    pub const RECOMPUTE_BASELINE_MEMORY: u16 = 24;
    pub const ENABLE_ENTRY_MEMORY: u16 = 25;
    pub const DISABLE_ENTRY_MEMORY: u16 = 26;
    pub const GET_ENTRY_ID_MEMORY: u16 = 27;

    pub const ENABLE_TABLES: u16 = 28;
    pub const DISABLE_TABLES: u16 = 29;
    pub const REPORT_BASELINE_TABLE: u16 = 30;
    pub const RECOMPUTE_BASELINE_TABLE: u16 = 31;
    pub const ENABLE_NAME_TABLE: u16 = 32;
    pub const DISABLE_NAME_TABLE: u16 = 33;

    pub const ENABLE_APPS: u16 = 34;
    pub const DISABLE_APPS: u16 = 35;
    pub const REPORT_BASELINE_APP: u16 = 36;
    pub const RECOMPUTE_BASELINE_APP: u16 = 37;
    pub const ENABLE_NAME_APP: u16 = 38;
    pub const DISABLE_NAME_APP: u16 = 39;
}

/// Arguments carried by a command message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandArgs {
    None,
    EntryId(usize),
    Address(usize),
    Name(String),
    OneShot {
        address: usize,
        size: usize,
        max_bytes_per_cycle: usize,
    },
}

impl CommandArgs {
    fn shape(&self) -> &'static str {
        match self {
            CommandArgs::None => NO_ARGS,
            CommandArgs::EntryId(_) => ENTRY_ID,
            CommandArgs::Address(_) => ADDRESS,
            CommandArgs::Name(_) => NAME,
            CommandArgs::OneShot { .. } => ONE_SHOT_ARGS,
        }
    }
}

const NO_ARGS: &str = "no arguments";
const ENTRY_ID: &str = "entry id";
const ADDRESS: &str = "address";
const NAME: &str = "name";
const ONE_SHOT_ARGS: &str = "one-shot range";

/// A decoded operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Noop,
    ResetCounters,
    OneShot {
        address: usize,
        size: usize,
        max_bytes_per_cycle: usize,
    },
    CancelOneShot,
    EnableAll,
    DisableAll,
    EnableResource(ResourceType),
    DisableResource(ResourceType),
    ReportBaseline(EntryRef),
    Recompute(EntryRef),
    SetEntryState {
        target: EntryRef,
        state: ResourceState,
    },
    GetEntryId {
        resource: ResourceType,
        address: usize,
    },
}

/// The operation a code selects within its resource group.
#[derive(Clone, Copy)]
enum GroupOp {
    Enable,
    Disable,
    Report,
    Recompute,
    EnableEntry,
    DisableEntry,
    GetEntryId,
}

impl Command {
    /// Decode `code` with its arguments.
    ///
    /// # Errors
    /// * `InvalidCommandCode` - the code is outside the known set
    /// * `InvalidLength` - the arguments do not fit the code
    pub fn decode(code: u16, args: CommandArgs) -> CsResult<Command> {
        use codes::*;

        let simple = |command: Command| expect_none(code, &args).map(|()| command);

        match code {
            NOOP => simple(Command::Noop),
            RESET => simple(Command::ResetCounters),
            ONE_SHOT => match args {
                CommandArgs::OneShot {
                    address,
                    size,
                    max_bytes_per_cycle,
                } => Ok(Command::OneShot {
                    address,
                    size,
                    max_bytes_per_cycle,
                }),
                other => Err(length_error(code, &other, ONE_SHOT_ARGS)),
            },
            CANCEL_ONE_SHOT => simple(Command::CancelOneShot),
            ENABLE_ALL => simple(Command::EnableAll),
            DISABLE_ALL => simple(Command::DisableAll),
            6..=9 => decode_group(code, ResourceType::CfeCore, code - 6, args),
            10..=13 => decode_group(code, ResourceType::Os, code - 10, args),
            14..=20 => decode_group(code, ResourceType::Eeprom, code - 14, args),
            21..=27 => decode_group(code, ResourceType::Memory, code - 21, args),
            28..=33 => decode_group(code, ResourceType::Tables, code - 28, args),
            34..=39 => decode_group(code, ResourceType::Apps, code - 34, args),
            _ => Err(CsError::InvalidCommandCode { code }),
        }
    }
}

fn length_error(code: u16, args: &CommandArgs, expected: &'static str) -> CsError {
    CsError::InvalidLength {
        code,
        actual: args.shape(),
        expected,
    }
}

fn expect_none(code: u16, args: &CommandArgs) -> CsResult<()> {
    match args {
        CommandArgs::None => Ok(()),
        other => Err(length_error(code, other, NO_ARGS)),
    }
}

fn decode_group(code: u16, resource: ResourceType, offset: u16, args: CommandArgs) -> CsResult<Command> {
    let op = match offset {
        0 => GroupOp::Enable,
        1 => GroupOp::Disable,
        2 => GroupOp::Report,
        3 => GroupOp::Recompute,
        4 => GroupOp::EnableEntry,
        5 => GroupOp::DisableEntry,
        6 => GroupOp::GetEntryId,
        _ => return Err(CsError::InvalidCommandCode { code }),
    };

    match op {
        GroupOp::Enable => expect_none(code, &args).map(|()| Command::EnableResource(resource)),
        GroupOp::Disable => expect_none(code, &args).map(|()| Command::DisableResource(resource)),
        GroupOp::Report => target_of(code, resource, args).map(Command::ReportBaseline),
        GroupOp::Recompute => target_of(code, resource, args).map(Command::Recompute),
        GroupOp::EnableEntry => target_of(code, resource, args).map(|target| {
            Command::SetEntryState {
                target,
                state: ResourceState::Enabled,
            }
        }),
        GroupOp::DisableEntry => target_of(code, resource, args).map(|target| {
            Command::SetEntryState {
                target,
                state: ResourceState::Disabled,
            }
        }),
        GroupOp::GetEntryId => match args {
            CommandArgs::Address(address) => Ok(Command::GetEntryId { resource, address }),
            other => Err(length_error(code, &other, ADDRESS)),
        },
    }
}

/// Entry a per-entry command of `resource` addresses.
fn target_of(code: u16, resource: ResourceType, args: CommandArgs) -> CsResult<EntryRef> {
    match (resource, args) {
        (ResourceType::CfeCore, CommandArgs::None) => Ok(EntryRef::CfeCore),
        (ResourceType::Os, CommandArgs::None) => Ok(EntryRef::Os),
        (ResourceType::Eeprom, CommandArgs::EntryId(id)) => Ok(EntryRef::Eeprom(id)),
        (ResourceType::Memory, CommandArgs::EntryId(id)) => Ok(EntryRef::Memory(id)),
        (ResourceType::Tables, CommandArgs::Name(name)) => Ok(EntryRef::Table(name)),
        (ResourceType::Apps, CommandArgs::Name(name)) => Ok(EntryRef::App(name)),
        (resource, other) => {
            let expected = match resource {
                ResourceType::CfeCore | ResourceType::Os => NO_ARGS,
                ResourceType::Eeprom | ResourceType::Memory => ENTRY_ID,
                ResourceType::Tables | ResourceType::Apps => NAME,
            };
            Err(length_error(code, &other, expected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::codes::*;
    use super::*;

    #[test]
    fn test_decode_simple_commands() {
        assert_eq!(Command::decode(NOOP, CommandArgs::None), Ok(Command::Noop));
        assert_eq!(
            Command::decode(DISABLE_ALL, CommandArgs::None),
            Ok(Command::DisableAll)
        );
        assert_eq!(
            Command::decode(ENABLE_OS, CommandArgs::None),
            Ok(Command::EnableResource(ResourceType::Os))
        );
        assert_eq!(
            Command::decode(RECOMPUTE_BASELINE_CFE_CORE, CommandArgs::None),
            Ok(Command::Recompute(EntryRef::CfeCore))
        );
    }

    #[test]
    fn test_decode_entry_commands() {
        assert_eq!(
            Command::decode(DISABLE_ENTRY_MEMORY, CommandArgs::EntryId(3)),
            Ok(Command::SetEntryState {
                target: EntryRef::Memory(3),
                state: ResourceState::Disabled,
            })
        );
        assert_eq!(
            Command::decode(GET_ENTRY_ID_EEPROM, CommandArgs::Address(0x1000)),
            Ok(Command::GetEntryId {
                resource: ResourceType::Eeprom,
                address: 0x1000,
            })
        );
        assert_eq!(
            Command::decode(REPORT_BASELINE_APP, CommandArgs::Name("LC".into())),
            Ok(Command::ReportBaseline(EntryRef::App("LC".into())))
        );
        assert_eq!(
            Command::decode(ENABLE_NAME_TABLE, CommandArgs::Name("LC.WDT".into())),
            Ok(Command::SetEntryState {
                target: EntryRef::Table("LC.WDT".into()),
                state: ResourceState::Enabled,
            })
        );
    }

    #[test]
    fn test_decode_one_shot() {
        let args = CommandArgs::OneShot {
            address: 0x2000,
            size: 64,
            max_bytes_per_cycle: 0,
        };
        assert_eq!(
            Command::decode(ONE_SHOT, args),
            Ok(Command::OneShot {
                address: 0x2000,
                size: 64,
                max_bytes_per_cycle: 0,
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        assert_eq!(
            Command::decode(40, CommandArgs::None),
            Err(CsError::InvalidCommandCode { code: 40 })
        );
        assert_eq!(
            Command::decode(u16::MAX, CommandArgs::None),
            Err(CsError::InvalidCommandCode { code: u16::MAX })
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert_eq!(
            Command::decode(NOOP, CommandArgs::EntryId(1)),
            Err(CsError::InvalidLength {
                code: NOOP,
                actual: "entry id",
                expected: "no arguments",
            })
        );
        assert!(matches!(
            Command::decode(RECOMPUTE_BASELINE_EEPROM, CommandArgs::Name("x".into())),
            Err(CsError::InvalidLength { expected: "entry id", .. })
        ));
        assert!(matches!(
            Command::decode(GET_ENTRY_ID_MEMORY, CommandArgs::EntryId(0)),
            Err(CsError::InvalidLength { expected: "address", .. })
        ));
        assert!(matches!(
            Command::decode(ONE_SHOT, CommandArgs::None),
            Err(CsError::InvalidLength {
                code: ONE_SHOT,
                actual: "no arguments",
                expected: "one-shot range",
            })
        ));
        assert!(matches!(
            Command::decode(
                NOOP,
                CommandArgs::OneShot {
                    address: 0,
                    size: 4,
                    max_bytes_per_cycle: 0,
                }
            ),
            Err(CsError::InvalidLength {
                actual: "one-shot range",
                expected: "no arguments",
                ..
            })
        ));
    }

    #[test]
    fn test_every_code_in_range_decodes_with_some_shape() {
        let shapes = [
            CommandArgs::None,
            CommandArgs::EntryId(0),
            CommandArgs::Address(0),
            CommandArgs::Name("A.B".into()),
            CommandArgs::OneShot {
                address: 0,
                size: 1,
                max_bytes_per_cycle: 0,
            },
        ];
        for code in 0..=DISABLE_NAME_APP {
            assert!(
                shapes
                    .iter()
                    .any(|args| Command::decode(code, args.clone()).is_ok()),
                "code {} never decodes",
                code
            );
        }
    }
}
