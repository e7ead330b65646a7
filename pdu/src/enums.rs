//! Standard enumeration values (SISO-REF-010) used by the engine.

/// Entity kind codes [0 .. 9]
pub mod kind {
    pub const OTHER: u8 = 0;
    pub const PLATFORM: u8 = 1;
    pub const MUNITION: u8 = 2;
    pub const LIFEFORM: u8 = 3;
    pub const ENVIRONMENTAL: u8 = 4;
    pub const CULTURAL_FEATURE: u8 = 5;
    pub const SUPPLY: u8 = 6;
    pub const RADIO: u8 = 7;
    pub const EXPENDABLE: u8 = 8;
    pub const SENSOR_EMITTER: u8 = 9;
    pub const COUNT: u8 = 10;
}

/// Platform domain codes [0 .. 5]
pub mod platform_domain {
    pub const OTHER: u8 = 0;
    pub const LAND: u8 = 1;
    pub const AIR: u8 = 2;
    pub const SURFACE: u8 = 3;
    pub const SUBSURFACE: u8 = 4;
    pub const SPACE: u8 = 5;
}

/// Munition domain codes [0 .. 11]
pub mod munition_domain {
    pub const OTHER: u8 = 0;
    pub const ANTI_AIR: u8 = 1;
    pub const ANTI_ARMOR: u8 = 2;
    pub const ANTI_GUIDED_MUNITION: u8 = 3;
    pub const ANTIRADAR: u8 = 4;
    pub const ANTISATELLITE: u8 = 5;
    pub const ANTISHIP: u8 = 6;
    pub const ANTISUBMARINE: u8 = 7;
    pub const ANTIPERSONNEL: u8 = 8;
    pub const BATTLEFIELD_SUPPORT: u8 = 9;
    pub const STRATEGIC: u8 = 10;
    pub const TACTICAL: u8 = 11;
}

/// Largest domain code in any kind
pub const MAX_ENTITY_DOMAIN: u8 = munition_domain::TACTICAL;

pub mod country {
    pub const OTHER: u16 = 0;
    pub const FRANCE: u16 = 71;
    pub const CIS: u16 = 222;
    pub const UK: u16 = 224;
    pub const USA: u16 = 225;
}

/// Force id codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ForceId {
    #[default]
    Other,
    Friendly,
    Opposing,
    Neutral,
    Unassigned(u8),
}

impl ForceId {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Other,
            1 => Self::Friendly,
            2 => Self::Opposing,
            3 => Self::Neutral,
            v => Self::Unassigned(v),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Other => 0,
            Self::Friendly => 1,
            Self::Opposing => 2,
            Self::Neutral => 3,
            Self::Unassigned(v) => v,
        }
    }
}

/// Entity appearance bits common to all kinds
pub mod appearance {
    /// Bit 23: the entity has been deactivated and should be removed
    pub const DEACTIVATED: u32 = 1 << 23;
    /// Bits 3-4: damage state
    pub const DAMAGE_MASK: u32 = 0b11 << 3;
    pub const DAMAGE_DESTROYED: u32 = 0b11 << 3;
}

/// Acknowledge flag values
pub mod acknowledge_flag {
    pub const CREATE_ENTITY: u16 = 1;
    pub const REMOVE_ENTITY: u16 = 2;
    pub const START_RESUME: u16 = 3;
    pub const STOP_FREEZE: u16 = 4;
    pub const TRANSFER_CONTROL: u16 = 5;
}

/// Acknowledge response flag values
pub mod response_flag {
    pub const OTHER: u16 = 0;
    pub const ABLE_TO_COMPLY: u16 = 1;
    pub const UNABLE_TO_COMPLY: u16 = 2;
    pub const PENDING_OPERATOR_ACTION: u16 = 3;
}

/// Action response request-status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestStatus {
    #[default]
    Other,
    Pending,
    Executing,
    PartiallyComplete,
    Complete,
    Rejected,
    Unassigned(u32),
}

impl RequestStatus {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Other,
            1 => Self::Pending,
            2 => Self::Executing,
            3 => Self::PartiallyComplete,
            4 => Self::Complete,
            5 => Self::Rejected,
            v => Self::Unassigned(v),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Other => 0,
            Self::Pending => 1,
            Self::Executing => 2,
            Self::PartiallyComplete => 3,
            Self::Complete => 4,
            Self::Rejected => 5,
            Self::Unassigned(v) => v,
        }
    }
}

/// Detonation result codes used by the engine
pub mod detonation_result {
    pub const OTHER: u8 = 0;
    pub const ENTITY_IMPACT: u8 = 1;
    pub const ENTITY_PROXIMATE_DETONATION: u8 = 2;
    pub const GROUND_IMPACT: u8 = 3;
    pub const DETONATION: u8 = 5;
    pub const NONE: u8 = 6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_id_codes() {
        for code in 0..=10u8 {
            assert_eq!(ForceId::from_u8(code).as_u8(), code);
        }
        assert_eq!(ForceId::from_u8(2), ForceId::Opposing);
    }

    #[test]
    fn test_request_status_codes() {
        assert_eq!(RequestStatus::from_u32(5), RequestStatus::Rejected);
        assert_eq!(RequestStatus::from_u32(77).as_u32(), 77);
    }

    #[test]
    fn test_deactivated_bit() {
        assert_eq!(appearance::DEACTIVATED, 0x0080_0000);
    }
}
