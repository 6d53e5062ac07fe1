//! scash-cli: command-line interface for the SCASH single-address wallet.
//!
//! Wallet files are password-encrypted backups; the node is reached over
//! JSON-RPC for fee estimates, UTXO scans and broadcasting.

mod config;
mod rpc;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use zeroize::Zeroizing;

use scash_core::constants::{TICKER, format_coin, parse_coin_str};
use scash_core::traits::FeeRateSource;
use scash_core::types::SpendOutput;
use scash_wallet::{
    CoinSelector, FeeRate, PendingLedger, PendingStatus, SigningKey, SpendPlan, Wallet, WalletFile,
    estimate_fee,
};

use crate::config::CliConfig;
use crate::rpc::NodeRpc;

/// SCASH command-line wallet.
#[derive(Parser)]
#[command(name = "scash-cli")]
#[command(version, about = "Single-address SCASH wallet")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Use the test network (overrides SCASH_TESTNET).
    #[arg(long, global = true)]
    testnet: bool,

    /// Node RPC URL (overrides SCASH_RPC_URL).
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Data directory (overrides SCASH_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Fee confirmation target in blocks (overrides SCASH_CONF_TARGET).
    #[arg(long, global = true)]
    conf_target: Option<u16>,

    /// Wallet file (default: <data dir>/scash-wallet.json).
    #[arg(short, long, global = true)]
    wallet: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wallet management subcommands.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Show the wallet address.
    Address,
    /// Show the current network fee rate.
    Fee,
    /// Query the wallet balance from the node.
    Balance,
    /// Send coins to an address.
    Send(SendArgs),
    /// List broadcast transactions and refresh their confirmation status.
    Pending,
}

#[derive(Subcommand)]
enum WalletAction {
    /// Create a new wallet with a fresh mnemonic.
    Create,
    /// Restore a wallet from a 12-word mnemonic.
    Restore,
    /// Reveal the mnemonic and private key.
    Show,
}

#[derive(Args)]
struct SendArgs {
    /// Recipient address.
    #[arg(short, long)]
    to: String,

    /// Amount in whole coins (e.g. 10.5).
    #[arg(short, long)]
    amount: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,
}

struct Session {
    config: CliConfig,
    wallet_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli.global)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let wallet_path = cli.global.wallet.clone().unwrap_or_else(|| config.wallet_path());
    let ctx = Session {
        config,
        wallet_path,
    };

    match cli.command {
        Commands::Wallet { action } => match action {
            WalletAction::Create => wallet_create(&ctx),
            WalletAction::Restore => wallet_restore(&ctx),
            WalletAction::Show => wallet_show(&ctx),
        },
        Commands::Address => wallet_address(&ctx),
        Commands::Fee => fee(&ctx).await,
        Commands::Balance => balance(&ctx).await,
        Commands::Send(args) => send(&ctx, args).await,
        Commands::Pending => pending(&ctx).await,
    }
}

fn resolve_config(global: &GlobalArgs) -> Result<CliConfig> {
    let mut config = CliConfig::from_env()?;
    if global.testnet {
        config.network = scash_core::network::Network::Testnet;
    }
    if let Some(url) = &global.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(target) = global.conf_target {
        if target == 0 {
            bail!("--conf-target must be at least 1");
        }
        config.conf_target = target;
    }
    Ok(config)
}

/// Create a new wallet and print its backup phrase once.
fn wallet_create(ctx: &Session) -> Result<()> {
    if ctx.wallet_path.exists() {
        bail!("Wallet file already exists: {}", ctx.wallet_path.display());
    }
    let password = prompt_new_password()?;

    let (wallet, mnemonic) =
        Wallet::create(ctx.config.params(), &password).context("Failed to create wallet")?;
    save_wallet(ctx, &wallet)?;

    println!("\n=== WALLET CREATED ===");
    println!("Network: {:?}", ctx.config.network);
    println!("Address: {}", wallet.address());
    println!("\nMNEMONIC (BACK THIS UP, 12 WORDS):");
    println!("  {}", mnemonic.as_str());
    println!("\nWARNING: This phrase will NOT be shown again.");
    println!("Anyone with this phrase can spend your funds.");
    println!("\nWallet saved to: {}", ctx.wallet_path.display());
    Ok(())
}

/// Restore a wallet from a mnemonic.
fn wallet_restore(ctx: &Session) -> Result<()> {
    if ctx.wallet_path.exists() {
        bail!("Wallet file already exists: {}", ctx.wallet_path.display());
    }
    let mnemonic = prompt_password("Enter 12-word mnemonic")?;
    let password = prompt_new_password()?;

    let wallet = Wallet::restore(&mnemonic, &password, ctx.config.params())
        .context("Failed to restore wallet")?;
    save_wallet(ctx, &wallet)?;

    println!("\n=== WALLET RESTORED ===");
    println!("Address: {}", wallet.address());
    println!("Wallet saved to: {}", ctx.wallet_path.display());
    Ok(())
}

/// Reveal the stored secrets after re-entering the password.
fn wallet_show(ctx: &Session) -> Result<()> {
    let (wallet, password) = open_wallet(ctx)?;
    let record = wallet.unlock(&password).context("Failed to unlock wallet")?;
    let key = SigningKey::derive(&record.mnemonic, ctx.config.params())
        .context("Failed to derive key")?;

    println!("Address:  {}", record.address);
    println!("Path:     {}", record.path);
    println!("Mnemonic: {}", record.mnemonic);
    println!("WIF:      {}", record.private_key);
    println!("Account xpub: {}", key.account_xpub());
    Ok(())
}

fn wallet_address(ctx: &Session) -> Result<()> {
    let (wallet, _) = open_wallet(ctx)?;
    println!("{}", wallet.address());
    Ok(())
}

async fn fee(ctx: &Session) -> Result<()> {
    let rpc = node(ctx)?;
    let quote = rpc
        .fee_rate_per_kb(ctx.config.conf_target)
        .await
        .context("Failed to fetch fee rate")?;
    let rate = FeeRate::from_coin_per_kb(quote)?;
    let typical = estimate_fee(1, 2, rate);

    println!("Fee rate: {rate} (target {} blocks)", ctx.config.conf_target);
    println!(
        "Typical 1-in 2-out payment: {} vB, {} {TICKER}",
        typical.vsize,
        format_coin(typical.fee_sat)
    );
    Ok(())
}

async fn balance(ctx: &Session) -> Result<()> {
    let rpc = node(ctx)?;
    let (wallet, _) = open_wallet(ctx)?;
    let ledger = PendingLedger::load(&ctx.config.pending_path())?;
    let utxos = wallet
        .unspent(&rpc, &ledger)
        .await
        .context("Failed to scan UTXOs")?;

    let total: u64 = utxos.iter().map(|u| u.amount).sum();
    let spendable = CoinSelector::spendable_balance(&utxos);

    println!("\n=== WALLET BALANCE ===");
    println!("Address:   {}", wallet.address());
    println!("UTXOs:     {}", utxos.len());
    println!("Total:     {} {TICKER}", format_coin(total));
    println!("Spendable: {} {TICKER}", format_coin(spendable));
    if total > spendable {
        println!("In mempool: {} {TICKER}", format_coin(total - spendable));
    }
    Ok(())
}

async fn send(ctx: &Session, args: SendArgs) -> Result<()> {
    let amount = parse_coin_str(&args.amount).context("Invalid amount")?;
    let rpc = node(ctx)?;
    let (wallet, password) = open_wallet(ctx)?;
    let pending_path = ctx.config.pending_path();
    let mut ledger = PendingLedger::load(&pending_path)?;

    let rate = wallet
        .fee_rate(&rpc, ctx.config.conf_target)
        .await
        .context("Failed to fetch fee rate")?;
    let utxos = wallet
        .unspent(&rpc, &ledger)
        .await
        .context("Failed to scan UTXOs")?;

    let outputs = [SpendOutput::new(args.to.trim(), amount)];
    let plan = wallet
        .prepare_send(&utxos, &outputs, rate)
        .context("Failed to plan transaction")?;
    print_plan(&plan);

    if !args.yes && !confirm("Send this transaction?")? {
        println!("Aborted.");
        return Ok(());
    }

    let signed = wallet.sign(&plan, &password).context("Failed to sign transaction")?;
    let txid = wallet
        .submit(&rpc, &signed, &mut ledger, chrono::Utc::now().timestamp_millis())
        .await
        .context("Node rejected transaction")?;
    ledger
        .save(&pending_path)
        .context("Failed to save pending ledger")?;

    println!("\n=== TRANSACTION SENT ===");
    println!("TxID: {txid}");
    Ok(())
}

async fn pending(ctx: &Session) -> Result<()> {
    let rpc = node(ctx)?;
    let pending_path = ctx.config.pending_path();
    let mut ledger = PendingLedger::load(&pending_path)?;

    let ids: Vec<String> = ledger.pending().map(|t| t.id.clone()).collect();
    let mut changed = false;
    for id in ids {
        match rpc.blockhash(&id).await {
            Ok(Some(_)) => changed |= ledger.mark_confirmed(&id),
            Ok(None) => {}
            Err(e) => tracing::warn!(txid = %id, error = %e, "status lookup failed"),
        }
    }
    if changed {
        ledger
            .save(&pending_path)
            .context("Failed to save pending ledger")?;
    }

    if ledger.is_empty() {
        println!("No broadcast transactions.");
        return Ok(());
    }
    for tx in ledger.all() {
        let status = match tx.status {
            PendingStatus::Pending => "pending",
            PendingStatus::Confirmed => "confirmed",
        };
        let created = chrono::DateTime::from_timestamp_millis(tx.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{}  {:<9}  {}  out {} {TICKER}  fee {}",
            tx.id,
            status,
            created,
            format_coin(tx.total_output),
            format_coin(tx.network_fee + tx.platform_fee)
        );
    }
    Ok(())
}

fn print_plan(plan: &SpendPlan) {
    println!("\n=== TRANSACTION PLAN ===");
    for o in &plan.outputs {
        println!("To:           {} ({} {TICKER})", o.address, format_coin(o.amount));
    }
    println!("Inputs:       {}", plan.selection.len());
    println!("Network fee:  {} {TICKER} ({} vB)", format_coin(plan.network_fee), plan.fee.vsize);
    println!("Platform fee: {} {TICKER}", format_coin(plan.platform_fee));
    println!("Change:       {} {TICKER}", format_coin(plan.change()));
}

fn node(ctx: &Session) -> Result<NodeRpc> {
    NodeRpc::new(&ctx.config.rpc_url, ctx.config.rpc_timeout)
}

fn open_wallet(ctx: &Session) -> Result<(Wallet, Zeroizing<String>)> {
    let file = WalletFile::load(&ctx.wallet_path)
        .with_context(|| format!("Failed to read wallet {}", ctx.wallet_path.display()))?;
    let password = prompt_password("Wallet password")?;
    let wallet = Wallet::from_file(&file, &password, ctx.config.params())
        .context("Failed to open wallet (check password)")?;
    Ok((wallet, password))
}

fn save_wallet(ctx: &Session, wallet: &Wallet) -> Result<()> {
    if let Some(parent) = ctx.wallet_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    wallet
        .to_file()
        .save(&ctx.wallet_path)
        .context("Failed to save wallet")
}

/// Prompt for a secret without echo.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(format!("{prompt}: "))
        .map(Zeroizing::new)
        .context("Failed to read password")
}

fn prompt_new_password() -> Result<Zeroizing<String>> {
    let password = prompt_password("Enter wallet password")?;
    let confirm = prompt_password("Confirm password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
