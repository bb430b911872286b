use super::TransactionSummary;
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::info;

pub const WITHDRAWALS_ROOT: &str = ".withdrawals";
const WITHDRAWALS_FILE: &str = "withdrawals.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NetworkEnv {
    Mainnet,
    Sepolia,
    Local,
}

impl NetworkEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            NetworkEnv::Mainnet => "mainnet",
            NetworkEnv::Sepolia => "sepolia",
            NetworkEnv::Local => "local",
        }
    }
}

impl fmt::Display for NetworkEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkEnv::Mainnet => "Mainnet",
            NetworkEnv::Sepolia => "Sepolia",
            NetworkEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub submitted_at: String,
    pub transaction_hash: String,
    pub receiver: String,
    pub amount: String,
    pub token: String,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl WithdrawalRecord {
    pub fn from_summary(summary: &TransactionSummary, api_url: Option<&str>) -> Self {
        Self {
            submitted_at: Utc::now().to_rfc3339(),
            transaction_hash: summary.transaction_hash.clone(),
            receiver: summary.receiver.to_string(),
            amount: summary.amount.clone(),
            token: summary.token.symbol().to_string(),
            api_url: api_url.map(str::to_string),
        }
    }
}

/// Submitted withdrawals of one network, one entry per transaction hash.
#[derive(Debug)]
pub struct WithdrawalLog {
    path: PathBuf,
}

impl WithdrawalLog {
    /// Opens the log of `env` under `root`. The file itself appears with the
    /// first recorded withdrawal.
    pub fn open(root: impl AsRef<Path>, env: NetworkEnv) -> Result<Self> {
        let dir = root.as_ref().join(env.dir_name());
        fs::create_dir_all(&dir).wrap_err_with(|| {
            format!("Failed to create withdrawal log directory {}", dir.display())
        })?;
        Ok(Self {
            path: dir.join(WITHDRAWALS_FILE),
        })
    }

    /// Records in submission order.
    pub fn load(&self) -> Result<Vec<WithdrawalRecord>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).wrap_err_with(|| {
                    format!("Failed to read withdrawal log {}", self.path.display())
                });
            }
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&data).wrap_err_with(|| {
            format!("Withdrawal log {} is not valid JSON", self.path.display())
        })
    }

    pub fn find(&self, transaction_hash: &str) -> Result<Option<WithdrawalRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|r| same_transaction(&r.transaction_hash, transaction_hash)))
    }

    /// Adds `record` unless its transaction is already logged. Returns
    /// whether the log changed.
    pub fn record(&self, record: WithdrawalRecord) -> Result<bool> {
        let mut records = self.load()?;
        if records
            .iter()
            .any(|r| same_transaction(&r.transaction_hash, &record.transaction_hash))
        {
            return Ok(false);
        }
        info!(tx = %record.transaction_hash, token = %record.token, "recording withdrawal");
        records.push(record);
        self.persist(&records)?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Written to a sibling file, then renamed over the log.
    fn persist(&self, records: &[WithdrawalRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)
            .wrap_err("Failed to serialize withdrawal records")?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).wrap_err_with(|| {
            format!("Failed to write withdrawal records to {}", staging.display())
        })?;
        fs::rename(&staging, &self.path).wrap_err_with(|| {
            format!("Failed to replace withdrawal log {}", self.path.display())
        })
    }
}

/// Hashes are hex, compared without regard to case.
fn same_transaction(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
