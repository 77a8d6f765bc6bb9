//! Hotkey parsing
//!
//! Turns strings like `"Ctrl+Shift+T"` into the modifier flags and virtual
//! key code that `RegisterHotKey` expects.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;
pub const MOD_WIN: u32 = 0x0008;
pub const MOD_NOREPEAT: u32 = 0x4000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("hotkey is empty")]
    Empty,
    #[error("unknown hotkey token {0:?}")]
    UnknownToken(String),
    #[error("hotkey {0:?} has no key, only modifiers")]
    MissingKey(String),
    #[error("hotkey {0:?} names more than one key")]
    MultipleKeys(String),
}

/// Tracks which modifier keys are part of the combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
}

impl Modifiers {
    /// Check if any modifier is held
    pub fn any(&self) -> bool {
        self.control || self.shift || self.alt || self.win
    }
}

/// The non-modifier key of a combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `A`..=`Z`, stored uppercase
    Letter(char),
    /// `0`..=`9`
    Digit(u8),
    /// `F1`..=`F12`
    Function(u8),
}

impl Key {
    fn parse(token: &str) -> Option<Key> {
        let upper = token.to_uppercase();
        let mut chars = upper.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Some(Key::Letter(c)),
            (Some(c), None) if c.is_ascii_digit() => Some(Key::Digit(c as u8 - b'0')),
            (Some('F'), Some(_)) => match upper[1..].parse::<u8>() {
                Ok(n @ 1..=12) => Some(Key::Function(n)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Win32 virtual-key code
    pub fn virtual_key(&self) -> u32 {
        match *self {
            // VK_A..VK_Z and VK_0..VK_9 equal their ASCII codes
            Key::Letter(c) => c as u32,
            Key::Digit(d) => b'0' as u32 + d as u32,
            // VK_F1 = 0x70
            Key::Function(n) => 0x70 + (n as u32 - 1),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{}", c),
            Key::Digit(d) => write!(f, "{}", d),
            Key::Function(n) => write!(f, "F{}", n),
        }
    }
}

/// A global hotkey combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Hotkey {
    pub fn parse(s: &str) -> Result<Hotkey, HotkeyError> {
        let tokens: Vec<&str> = s
            .split('+')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(HotkeyError::Empty);
        }

        let mut modifiers = Modifiers::default();
        let mut key = None;

        for token in tokens {
            match token.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.control = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "win" | "super" | "meta" => modifiers.win = true,
                _ => {
                    let parsed = Key::parse(token)
                        .ok_or_else(|| HotkeyError::UnknownToken(token.to_string()))?;
                    if key.replace(parsed).is_some() {
                        return Err(HotkeyError::MultipleKeys(s.to_string()));
                    }
                }
            }
        }

        let key = key.ok_or_else(|| HotkeyError::MissingKey(s.to_string()))?;
        Ok(Hotkey { modifiers, key })
    }

    /// `fsModifiers` for `RegisterHotKey`, always with `MOD_NOREPEAT`
    pub fn modifier_flags(&self) -> u32 {
        let mut flags = MOD_NOREPEAT;
        if self.modifiers.control {
            flags |= MOD_CONTROL;
        }
        if self.modifiers.alt {
            flags |= MOD_ALT;
        }
        if self.modifiers.shift {
            flags |= MOD_SHIFT;
        }
        if self.modifiers.win {
            flags |= MOD_WIN;
        }
        flags
    }

    pub fn virtual_key(&self) -> u32 {
        self.key.virtual_key()
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hotkey::parse(s)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.control {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.alt {
            write!(f, "Alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "Shift+")?;
        }
        if self.modifiers.win {
            write!(f, "Win+")?;
        }
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_combinations() {
        let hk = Hotkey::parse("Ctrl+Shift+T").unwrap();
        assert!(hk.modifiers.control && hk.modifiers.shift);
        assert!(!hk.modifiers.alt && !hk.modifiers.win);
        assert_eq!(hk.virtual_key(), 'T' as u32);
        assert_eq!(hk.modifier_flags(), MOD_CONTROL | MOD_SHIFT | MOD_NOREPEAT);

        let hk = Hotkey::parse("shift+l").unwrap();
        assert_eq!(hk.key, Key::Letter('L'));
        assert_eq!(hk.modifier_flags(), MOD_SHIFT | MOD_NOREPEAT);

        let hk = Hotkey::parse(" Ctrl + Alt + F1 ").unwrap();
        assert_eq!(hk.key, Key::Function(1));
        assert_eq!(hk.virtual_key(), 0x70);
    }

    #[test]
    fn digits_and_high_function_keys() {
        assert_eq!(Hotkey::parse("Alt+7").unwrap().virtual_key(), 0x37);
        assert_eq!(Hotkey::parse("F12").unwrap().virtual_key(), 0x7B);
        assert!(!Hotkey::parse("F12").unwrap().modifiers.any());
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(Hotkey::parse(""), Err(HotkeyError::Empty));
        assert_eq!(Hotkey::parse(" + "), Err(HotkeyError::Empty));
        assert_eq!(
            Hotkey::parse("Ctrl+Shift"),
            Err(HotkeyError::MissingKey("Ctrl+Shift".to_string()))
        );
        assert_eq!(
            Hotkey::parse("Ctrl+A+B"),
            Err(HotkeyError::MultipleKeys("Ctrl+A+B".to_string()))
        );
        assert_eq!(
            Hotkey::parse("Ctrl+F13"),
            Err(HotkeyError::UnknownToken("F13".to_string()))
        );
        assert_eq!(
            Hotkey::parse("Hyper+X"),
            Err(HotkeyError::UnknownToken("Hyper".to_string()))
        );
    }

    #[test]
    fn display_is_canonical() {
        let hk: Hotkey = "shift+ctrl+t".parse().unwrap();
        assert_eq!(hk.to_string(), "Ctrl+Shift+T");
        assert_eq!(Hotkey::parse("alt+ctrl+f1").unwrap().to_string(), "Ctrl+Alt+F1");
    }
}
