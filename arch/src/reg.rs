use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum Reg {
    #[default]
    ZERO,
    IRA,
    PC,
    SP,
    RA,
    FP,
    A0,
    A1,
    T0,
    T1,
    T2,
    T3,
    S0,
    S1,
    S2,
    S3,
}

impl Reg {
    pub const COUNT: u8 = 16;

    /// Accepts ABI names (`t0`, `SP`) and numbered names (`r8`).
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(reg) = s.parse::<Self>() {
            return Some(reg);
        }
        let num = s.strip_prefix(['r', 'R'])?.parse::<u8>().ok()?;
        (num < Self::COUNT).then(|| Reg::from(num))
    }

    pub fn num(self) -> u8 {
        self.into()
    }
}
