//! Policy enums selected by configuration (spec.md §6 configuration table).
//! Grounded on the teacher's `CacheReplacementPolicy`/`CacheKind` style:
//! `strum::EnumString`/`Display` give free, case-insensitive string parsing
//! so these can come straight out of a config file or CLI flag.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AddressMappingPolicy {
    OpenPage,
    ClosePage,
    RowBankColumnBankGroupInterleave,
    RowColumnBank,
    BankRowColumn,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum L2SharingMode {
    TilePrivate,
    FullyShared,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataMappingPolicy {
    PageToBank,
    SetInterleaving,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NocModel {
    Functional,
    Simple,
    Detailed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    WriteBack,
    WriteThrough,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccessSchedulerPolicy {
    Fifo,
    FifoRrTypePriority,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommandSchedulerPolicy {
    Fifo,
    OldestRwOverPrecharge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn policies_round_trip_through_snake_case_strings() {
        assert_eq!(
            NocModel::from_str("simple").unwrap(),
            NocModel::Simple
        );
        assert_eq!(NocModel::Detailed.to_string(), "detailed");
        assert_eq!(
            DataMappingPolicy::from_str("set_interleaving").unwrap(),
            DataMappingPolicy::SetInterleaving
        );
    }
}
