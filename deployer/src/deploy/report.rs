use std::fmt;

use deployer_network_client_interface::ClusterInfo;
use num_bigint::BigUint;

use crate::core::genesis::Genesis;
use crate::utils::constants::{PREFUNDED_EWOQ_ADDRESS, PREFUNDED_EWOQ_PRIVATE_KEY, WEI_PER_TOKEN};

pub fn rpc_url(node_uri: &str, blockchain_id: &str) -> String {
    format!("{node_uri}/ext/bc/{blockchain_id}/rpc")
}

/// One line per node and deployed VM.
pub fn endpoints(info: &ClusterInfo) -> Vec<String> {
    info.node_infos
        .iter()
        .flat_map(|node| {
            info.custom_vms.iter().map(move |(blockchain_id, vm)| {
                format!(
                    "Endpoint at node {} for blockchain {:?} with VM ID {:?}: {}",
                    node.name,
                    blockchain_id,
                    vm.vm_id,
                    rpc_url(&node.uri, blockchain_id)
                )
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundedAccount {
    pub address: String,
    /// Balance in whole tokens, rounded down
    pub balance: BigUint,
    /// Only known for the well-known prefunded test account
    pub private_key: Option<&'static str>,
}

/// Everything a wallet needs to connect to the new chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDetails {
    pub rpc_url: Option<String>,
    pub funded_accounts: Vec<FundedAccount>,
    pub network_name: String,
    pub chain_id: u64,
    pub currency_symbol: String,
}

impl ConnectionDetails {
    pub fn new(rpc_url: Option<String>, genesis: &Genesis, network_name: &str, currency_symbol: &str) -> Self {
        let funded_accounts = genesis
            .alloc
            .iter()
            .map(|(address, balance)| FundedAccount {
                address: address.clone(),
                balance: balance / BigUint::from(WEI_PER_TOKEN),
                private_key: is_ewoq(address).then_some(PREFUNDED_EWOQ_PRIVATE_KEY),
            })
            .collect();

        Self {
            rpc_url,
            funded_accounts,
            network_name: network_name.to_string(),
            chain_id: genesis.chain_id,
            currency_symbol: currency_symbol.to_string(),
        }
    }
}

fn is_ewoq(address: &str) -> bool {
    let normalize = |address: &str| address.trim_start_matches("0x").to_ascii_lowercase();
    normalize(address) == normalize(PREFUNDED_EWOQ_ADDRESS)
}

impl fmt::Display for ConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RPC URL:          {}", self.rpc_url.as_deref().unwrap_or("-"))?;
        for account in &self.funded_accounts {
            match account.private_key {
                Some(key) => writeln!(
                    f,
                    "Funded address:   {} with {} (10^18) - private key: {}",
                    account.address, account.balance, key
                )?,
                None => writeln!(f, "Funded address:   {} with {}", account.address, account.balance)?,
            }
        }
        writeln!(f, "Network name:     {}", self.network_name)?;
        writeln!(f, "Chain ID:         {}", self.chain_id)?;
        write!(f, "Currency Symbol:  {}", self.currency_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{healthy_cluster, VALID_GENESIS};
    use rstest::rstest;
    use std::collections::BTreeMap;

    #[rstest]
    fn one_endpoint_per_node_and_vm() {
        let info = healthy_cluster(&["s1", "s2"], &[("chain-a", "s1", "bc-a"), ("chain-b", "s2", "bc-b")]);

        let lines = endpoints(&info);

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            format!(
                "Endpoint at node node1 for blockchain \"bc-a\" with VM ID \"{}\": http://127.0.0.1:9650/ext/bc/bc-a/rpc",
                info.custom_vms["bc-a"].vm_id
            )
        );
        assert!(lines[3].starts_with("Endpoint at node node2 for blockchain \"bc-b\""));
    }

    #[rstest]
    #[case::no_vms(healthy_cluster(&["s1"], &[]))]
    #[case::no_nodes(ClusterInfo { node_infos: vec![], ..healthy_cluster(&["s1"], &[("chain-a", "s1", "bc-a")]) })]
    fn nothing_to_list(#[case] info: ClusterInfo) {
        assert!(endpoints(&info).is_empty());
    }

    #[rstest]
    fn balances_are_whole_tokens_and_ewoq_shows_its_key() {
        let mut genesis = Genesis::from_slice(VALID_GENESIS.as_bytes()).unwrap();
        genesis.alloc.insert("0x1111".to_string(), BigUint::from(2_500_000_000_000_000_000u64));

        let details = ConnectionDetails::new(Some("http://node/rpc".to_string()), &genesis, "mychain", "TEST");

        assert_eq!(
            details.funded_accounts,
            vec![
                FundedAccount { address: "0x1111".to_string(), balance: BigUint::from(2u32), private_key: None },
                FundedAccount {
                    address: "8db97C7cEcE249c2b98bDC0226Cc4C2A57BF52FC".to_string(),
                    balance: BigUint::from(100_000_000u32),
                    private_key: Some(PREFUNDED_EWOQ_PRIVATE_KEY),
                },
            ]
        );
        let text = details.to_string();
        assert!(text.contains("Funded address:   0x1111 with 2\n"));
        assert!(text.contains(&format!("with 100000000 (10^18) - private key: {PREFUNDED_EWOQ_PRIVATE_KEY}")));
        assert!(text.ends_with("Chain ID:         99999\nCurrency Symbol:  TEST"));
    }

    #[rstest]
    fn empty_alloc_lists_no_accounts() {
        let genesis = Genesis { chain_id: 1, alloc: BTreeMap::new() };
        let details = ConnectionDetails::new(None, &genesis, "mychain", "TEST");
        assert!(details.funded_accounts.is_empty());
        assert!(details.to_string().starts_with("RPC URL:          -\n"));
    }
}
