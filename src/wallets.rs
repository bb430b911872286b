use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
};

const MAX_ADDRESS_NIBBLES: usize = 64;

/// A Starknet account address (`0x` followed by up to 64 hex digits),
/// kept in lowercase.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address has no hex digits")]
    Empty,
    #[error("address is longer than {MAX_ADDRESS_NIBBLES} hex digits")]
    TooLong,
    #[error("address contains non-hex characters: {0}")]
    NotHex(String),
}

impl AccountAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;
        if digits.is_empty() {
            return Err(AddressError::Empty);
        }
        if digits.len() > MAX_ADDRESS_NIBBLES {
            return Err(AddressError::TooLong);
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        hex::decode(&padded).map_err(|_| AddressError::NotHex(trimmed.to_string()))?;
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for narrow UI cells, e.g. `0x0123...cdef`.
    pub fn short(&self) -> String {
        if self.0.len() <= 14 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for AccountAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountAddress::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountAddress::parse(&value)
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountFile {
    #[serde(default)]
    deployment: Option<AccountDeployment>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountDeployment {
    #[serde(default)]
    address: Option<String>,
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".starkli-wallets"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read wallet directory")? {
        let entry = entry.wrap_err("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid wallet filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

/// Reads the account address from an account descriptor. Only the public
/// address is needed; nothing is decrypted.
pub fn read_account_address(descriptor: &WalletDescriptor) -> Result<AccountAddress> {
    let data = fs::read(&descriptor.path).wrap_err_with(|| {
        format!("Failed to read account file {}", descriptor.path.display())
    })?;
    let account: AccountFile = serde_json::from_slice(&data).wrap_err_with(|| {
        format!("Account file for '{}' is not valid JSON", descriptor.name)
    })?;
    let raw = account
        .deployment
        .and_then(|d| d.address)
        .or(account.address)
        .ok_or_else(|| {
            eyre!("Account file for '{}' has no address", descriptor.name)
        })?;
    AccountAddress::parse(&raw)
        .wrap_err_with(|| format!("Account '{}' has an invalid address", descriptor.name))
}

pub fn connect_wallet(dir: &Path, name: &str) -> Result<AccountAddress> {
    let descriptor = find_wallet(dir, name)?;
    read_account_address(&descriptor)
}
