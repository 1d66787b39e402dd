//! Livenet deploy and demo binary for the Nacre liquid-staking vault.
//!
//! This binary is intended to be run from `scripts/*` which loads `.env`.
//!
//! Run with:
//! - Deploy only:       NACRE_LIVENET_MODE=deploy cargo run --bin nacre_livenet --features=livenet
//! - Deploy + demo:     NACRE_LIVENET_MODE=deploy_and_demo cargo run --bin nacre_livenet --features=livenet
//! - Demo on existing:  NACRE_LIVENET_MODE=demo NACRE_EXISTING_NACRE=... NACRE_EXISTING_SCSPR=... cargo run ...
//! - Withdraw matured:  NACRE_LIVENET_MODE=withdraw NACRE_EXISTING_NACRE=... NACRE_EXISTING_SCSPR=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL          (required by Odra; placeholder URL is OK here)
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN    (motes)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_NACRE    (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - ODRA_CASPER_LIVENET_GAS                 (legacy fallback; motes)
//! - NACRE_EXISTING_SCSPR                    (64-hex or formatted "hash-..."/"contract-package-...")
//! - NACRE_EXISTING_NACRE                    (64-hex or formatted "hash-..."/"contract-package-...")
//! - NACRE_DEMO_STAKE_CSPR                   (default: 100)
//! - NACRE_DEMO_UNSTAKE_CSPR                 (default: 50 -- converted to wad)

use odra::host::{Deployer, HostRef, HostRefLoader, NoArgs};
use odra::prelude::*;
use odra::casper_types::{U256, U512};

use nacre_casper::staking_external::mock::{RewardPoolMock, StakingHubMock};
use nacre_casper::tokens::{SCSPRToken, SCSPRTokenHostRef, SCSPRTokenInitArgs};
use nacre_casper::vault::{Nacre, NacreHostRef, NacreInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;
const MOTES_TO_WAD_FACTOR: u128 = 1_000_000_000; // 1e9

const DEFAULT_DEPLOY_GAS_TOKEN_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_DEPLOY_GAS_NACRE_MOTES: u64 = 600_000_000_000; // 600 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

/// Convert motes (U512, 9 decimals) to wad (U256, 18 decimals)
fn motes_to_wad(motes: U512) -> U256 {
    let motes_u128 = motes.as_u128();
    U256::from(motes_u128) * U256::from(MOTES_TO_WAD_FACTOR)
}

fn main() {
    println!("============================================");
    println!("  Nacre Liquid Staking Vault - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("NACRE_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let should_deploy = mode == "deploy" || mode == "deploy_and_demo";
    let should_demo = mode == "demo" || mode == "deploy_and_demo";
    let should_withdraw = mode == "withdraw";
    let should_query = mode == "query";

    let gas_fallback = read_u64_env("ODRA_CASPER_LIVENET_GAS", DEFAULT_DEPLOY_GAS_TOKEN_MOTES);
    let deploy_gas_token = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN", gas_fallback);
    let deploy_gas_nacre =
        read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_NACRE", DEFAULT_DEPLOY_GAS_NACRE_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    let stake_cspr = read_u64_env("NACRE_DEMO_STAKE_CSPR", 100);
    let unstake_cspr = read_u64_env("NACRE_DEMO_UNSTAKE_CSPR", 50);

    let stake_motes = U512::from(stake_cspr) * U512::from(MOTES_PER_CSPR);
    let unstake_wad = motes_to_wad(U512::from(unstake_cspr) * U512::from(MOTES_PER_CSPR));

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy_token={} ({} CSPR), deploy_nacre={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas_token,
        deploy_gas_token / MOTES_PER_CSPR,
        deploy_gas_nacre,
        deploy_gas_nacre / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!(
        "[INFO] Demo params: stake={} CSPR, unstake={} CSPR",
        stake_cspr, unstake_cspr
    );
    println!();

    // ==========================================
    // Step 1: Deploy (or reuse) sCSPR
    // ==========================================
    let scspr = if should_deploy {
        println!("[STEP 1] Deploying sCSPR token...");
        env.set_gas(deploy_gas_token);
        let scspr = SCSPRToken::deploy(&env, SCSPRTokenInitArgs { minter: env.caller() });
        println!("[OK] sCSPR deployed at: {:?}", scspr.address());
        println!("     Name: {}", scspr.name());
        println!("     Symbol: {}", scspr.symbol());
        println!("     Minter: {:?}", scspr.minter());
        println!();
        scspr
    } else {
        println!("[STEP 1] Reusing existing sCSPR token...");
        let raw = std::env::var("NACRE_EXISTING_SCSPR")
            .unwrap_or_else(|_| panic!("NACRE_EXISTING_SCSPR must be set for mode={}", mode));
        let addr = parse_contract_address(&raw);
        println!("[OK] sCSPR: {:?}", addr);
        println!();
        SCSPRToken::load(&env, addr)
    };
    let scspr_addr = scspr.address();

    // ==========================================
    // Step 2: Deploy (or reuse) the vault with mock validator-side contracts
    // ==========================================
    let nacre = if should_deploy {
        println!("[STEP 2] Deploying staking hub and reward pool mocks...");
        env.set_gas(deploy_gas_token);
        let hub = StakingHubMock::deploy(&env, NoArgs);
        let pool = RewardPoolMock::deploy(&env, NoArgs);
        println!("[OK] Staking hub at: {:?}", hub.address());
        println!("[OK] Reward pool at: {:?}", pool.address());

        println!("[STEP 2] Deploying Nacre vault contract...");
        env.set_gas(deploy_gas_nacre);
        let mut nacre = Nacre::deploy(
            &env,
            NacreInitArgs {
                scspr: scspr_addr,
                staking_hub: hub.address(),
                reward_pool: pool.address(),
            },
        );
        println!("[OK] Nacre deployed at: {:?}", nacre.address());

        env.set_gas(call_gas);
        nacre.set_delegator(env.caller());
        println!("[OK] Delegator set to deployer.");
        println!();
        nacre
    } else {
        println!("[STEP 2] Reusing existing Nacre contract...");
        let raw = std::env::var("NACRE_EXISTING_NACRE")
            .unwrap_or_else(|_| panic!("NACRE_EXISTING_NACRE must be set for mode={}", mode));
        let addr = parse_contract_address(&raw);
        println!("[OK] Nacre: {:?}", addr);
        println!();
        Nacre::load(&env, addr)
    };
    let nacre_addr = nacre.address();

    // ==========================================
    // Step 3: Set sCSPR minter to Nacre (must succeed for stake to work)
    // ==========================================
    let scspr = if should_query {
        println!("[STEP 3] Skipping minter check (query mode)...");
        scspr
    } else {
        println!("[STEP 3] Setting sCSPR minter to Nacre...");
        env.set_gas(call_gas);
        let mut scspr = scspr;
        let current_minter = scspr.minter();

        println!("     Current minter: {:?}", current_minter);
        println!("     Nacre address:  {:?}", nacre_addr);

        let minter_matches = match &current_minter {
            Some(m) => {
                *m == nacre_addr
                    || m.as_contract_package_hash() == nacre_addr.as_contract_package_hash()
            }
            None => false,
        };

        if minter_matches {
            println!("[OK] sCSPR minter already set to Nacre.");
        } else {
            println!("     Calling set_minter...");
            scspr.set_minter(nacre_addr);

            let new_minter = scspr.minter();
            println!("[OK] sCSPR minter updated to: {:?}", new_minter);

            if new_minter.is_none() {
                panic!("[FATAL] set_minter succeeded but minter is None!");
            }
        }
        scspr
    };
    println!();

    // ==========================================
    // Demo: stake -> unstake -> (withdraw after unbonding)
    // ==========================================
    if should_demo || should_withdraw {
        let mut nacre = nacre;
        let caller = env.caller();

        if should_demo {
            println!("[DEMO 1] Staking {} CSPR...", stake_cspr);
            env.set_gas(call_gas);
            nacre.with_tokens(stake_motes).stake();
            println!("[OK] Stake complete.");
            print_pool_info(&nacre, caller, &scspr);

            println!("[DEMO 2] Unstaking {} CSPR worth of sCSPR...", unstake_cspr);
            env.set_gas(call_gas);
            nacre.unstake(unstake_wad);
            println!("[OK] Unstake queued.");
            print_pool_info(&nacre, caller, &scspr);
            println!(
                "[INFO] To withdraw, run with NACRE_LIVENET_MODE=withdraw after the unbonding window (~21d 2h)."
            );
        }

        if should_withdraw {
            println!("[DEMO] Withdrawing matured undelegation requests...");
            let requests = nacre.undelegation_requests(caller);
            if requests.is_empty() {
                println!("[WARN] No pending undelegation requests. Skipping.");
            } else {
                // Withdrawing shifts indices (swap-with-last), so always take
                // index 0 and re-read the queue.
                let mut withdrawn = 0u32;
                while nacre.request_count(caller) > 0 {
                    let remaining = nacre.unlock_remaining_ms(caller, 0);
                    if remaining > 0 {
                        println!(
                            "[WARN] Request 0 still locked for {} ms. Stopping.",
                            remaining
                        );
                        break;
                    }
                    env.set_gas(call_gas);
                    nacre.withdraw(0);
                    withdrawn += 1;
                }
                println!("[OK] Withdrew {} request(s).", withdrawn);
                print_pool_info(&nacre, caller, &scspr);
            }
        }
    }

    // ==========================================
    // Query mode: Output pool state as JSON
    // ==========================================
    if should_query {
        let nacre = NacreHostRef::new(nacre_addr, env.clone());
        let query_user = env.caller();
        let scspr_balance = scspr.balance_of(query_user);

        println!(
            "NACRE_POOL_JSON={{\"total_custody\":\"{}\",\"total_delegated\":\"{}\",\"reserved_for_unbonding\":\"{}\",\"total_pool_value\":\"{}\",\"exchange_rate\":\"{}\",\"request_count\":{},\"scspr_balance\":\"{}\",\"user\":\"{:?}\"}}",
            nacre.total_custody(),
            nacre.total_delegated(),
            nacre.reserved_for_unbonding(),
            nacre.total_pool_value(),
            nacre.exchange_rate(),
            nacre.request_count(query_user),
            scspr_balance,
            query_user
        );
        return;
    }

    output_deploy_json(scspr_addr, nacre_addr);
}

fn print_pool_info(nacre: &NacreHostRef, user: Address, scspr: &SCSPRTokenHostRef) {
    println!("     exchange_rate: {} (wad)", nacre.exchange_rate());
    println!(
        "     total_custody: {} motes ({} CSPR)",
        nacre.total_custody(),
        nacre.total_custody().as_u64() / MOTES_PER_CSPR
    );
    println!("     total_delegated: {}", nacre.total_delegated());
    println!("     reserved_for_unbonding: {}", nacre.reserved_for_unbonding());
    println!("     total_pool_value: {}", nacre.total_pool_value());
    println!("     pending requests: {}", nacre.request_count(user));
    println!("     user sCSPR balance: {}", scspr.balance_of(user));
    println!();
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn output_deploy_json(scspr_addr: Address, nacre_addr: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    let scspr_hash = format_address_hash(&scspr_addr);
    let nacre_hash = format_address_hash(&nacre_addr);

    println!(
        r#"NACRE_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","scspr_contract_hash":"{}","nacre_contract_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        scspr_hash,
        nacre_hash,
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    if let Some(start) = debug_str.find('[') {
        if let Some(end) = debug_str.rfind(']') {
            let bytes_str = &debug_str[start + 1..end];
            let hex_parts: Vec<&str> = bytes_str.split(", ").collect();
            let mut result = String::new();
            for part in hex_parts {
                if let Some(hex) = part.strip_prefix("0x") {
                    result.push_str(hex);
                } else if let Some(hex) = part.strip_prefix("0X") {
                    result.push_str(hex);
                }
            }
            return result;
        }
    }
    debug_str
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::contracts::ContractPackageHash;
    use odra::casper_types::account::AccountHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        for i in 0..32 {
            let byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
            out[i] = byte;
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        let bytes = decode_hex_32(hex);
        return Address::Account(AccountHash::new(bytes));
    }
    if let Some(hex) = trimmed.strip_prefix("contract-package-") {
        let bytes = decode_hex_32(hex);
        return Address::Contract(ContractPackageHash::new(bytes));
    }
    if let Some(hex) = trimmed.strip_prefix("package-") {
        let bytes = decode_hex_32(hex);
        return Address::Contract(ContractPackageHash::new(bytes));
    }
    if let Some(hex) = trimmed.strip_prefix("hash-") {
        let bytes = decode_hex_32(hex);
        return Address::Contract(ContractPackageHash::new(bytes));
    }

    if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        let bytes = decode_hex_32(trimmed);
        return Address::Contract(ContractPackageHash::new(bytes));
    }

    panic!("Invalid address format: {}", trimmed);
}
