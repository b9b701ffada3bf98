//! # Chain Catch-Up Integration
//!
//! The chain-state monitor replaying missed blocks through the real
//! dispatcher wiring, driven by the job executor exactly as the
//! scheduler would drive it.

#[cfg(test)]
mod tests {
    use dw_01_store_gateway::Store as _;
    use dw_02_chain_client::models::{
        BlockTransaction, ClarityValue, ContractCallData, ContractLog, TransactionEventRecord,
    };
    use dw_02_chain_client::{ChainApi, MockChainApi};
    use dw_03_job_engine::ExecutionDisposition;
    use node_runtime::{AppContext, AppContextBuilder, RuntimeConfig};
    use serde_json::json;
    use shared_types::{ProposalKey, ProposalKind};
    use std::sync::Arc;

    const EXT: &str = "SP2X0TZ59D5SZ8ACQ6YMCHHNR2ZN51Z32E2CJ173.action-proposals-v2";
    const TOKEN: &str = "SP2X0TZ59D5SZ8ACQ6YMCHHNR2ZN51Z32E2CJ173.faces-token";

    async fn wired(chain: Arc<MockChainApi>) -> AppContext {
        AppContextBuilder::new(RuntimeConfig::default())
            .with_chain(chain as Arc<dyn ChainApi>)
            .build()
            .expect("context wires")
    }

    async fn seed(context: &AppContext, height: u64) {
        context
            .dao_webhook
            .process(&json!({
                "name": "facesdao",
                "mission": "m",
                "contracts": [
                    { "type": "TOKEN", "subtype": "DAO", "contract_principal": TOKEN, "tx_id": "0xt0" },
                    { "type": "EXTENSIONS", "subtype": "ACTION_PROPOSALS", "contract_principal": EXT, "tx_id": "0xt1" }
                ],
                "token_info": { "symbol": "FACE", "decimals": 6, "max_supply": "1000000000" }
            }))
            .await
            .expect("dao webhook");
        context
            .store
            .upsert_chain_state(context.config.network, height, "0xseed")
            .await
            .unwrap();
    }

    fn coinbase(height: u64, index: u32) -> BlockTransaction {
        BlockTransaction {
            tx_id: format!("0xcoinbase{height}x{index}"),
            tx_index: index,
            tx_status: "success".to_string(),
            tx_type: "coinbase".to_string(),
            block_hash: format!("0xblock{height}"),
            parent_block_hash: format!("0xblock{}", height - 1),
            block_height: height,
            block_time: 1_700_000_000 + height as i64,
            burn_block_height: 800_000 + height,
            ..BlockTransaction::default()
        }
    }

    fn propose_call(height: u64, index: u32, proposal_id: u64) -> BlockTransaction {
        BlockTransaction {
            tx_id: format!("0xpropose{proposal_id}"),
            tx_index: index,
            tx_status: "success".to_string(),
            tx_type: "contract_call".to_string(),
            sender_address: "SP000A".to_string(),
            contract_call: Some(ContractCallData {
                contract_id: EXT.to_string(),
                function_name: "propose-action".to_string(),
                function_args: vec![],
            }),
            events: vec![TransactionEventRecord {
                event_index: 0,
                event_type: "smart_contract_log".to_string(),
                tx_id: format!("0xpropose{proposal_id}"),
                contract_log: Some(ContractLog {
                    contract_id: EXT.to_string(),
                    topic: "print".to_string(),
                    value: ClarityValue {
                        hex: String::new(),
                        repr: format!(
                            r#"{{"notification":"propose-action","payload":{{"proposalId":{proposal_id},"creator":"SP000A","parameters":"replayed"}}}}"#
                        ),
                    },
                }),
                asset: None,
            }],
            ..coinbase(height, index)
        }
    }

    async fn run_monitor(context: &AppContext) -> dw_03_job_engine::JobExecution {
        let entry = context
            .registry
            .get("chain_state_monitor")
            .expect("monitor registered");
        context.executor.run(&entry).await
    }

    #[tokio::test]
    async fn test_fresh_within_hysteresis_no_dispatch() {
        let chain = Arc::new(MockChainApi::new());
        chain.set_tip(110);
        let context = wired(Arc::clone(&chain)).await;
        seed(&context, 100).await;

        let execution = run_monitor(&context).await;
        assert!(matches!(
            execution.disposition,
            ExecutionDisposition::Completed
        ));
        let payload = execution.outcomes[0].payload.as_ref().unwrap();
        assert_eq!(payload["is_stale"], false);
        assert_eq!(payload["blocks_behind"], 10);

        // No synthesized dispatch: stored height untouched.
        let state = context
            .store
            .get_chain_state(context.config.network)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.block_height, 100);
    }

    #[tokio::test]
    async fn test_catch_up_replays_every_missing_block() {
        let chain = Arc::new(MockChainApi::new());
        chain.set_tip(115);
        for height in 101..=115 {
            chain.put_block(height, vec![coinbase(height, 0), coinbase(height, 1)]);
        }
        let context = wired(Arc::clone(&chain)).await;
        seed(&context, 100).await;

        let execution = run_monitor(&context).await;
        assert!(matches!(
            execution.disposition,
            ExecutionDisposition::Completed
        ));
        let payload = execution.outcomes[0].payload.as_ref().unwrap();
        assert_eq!(payload["blocks_behind"], 15);
        assert_eq!(payload["blocks_processed"].as_array().unwrap().len(), 15);

        // One dispatch per missing block advanced chain state to the tip.
        let state = context
            .store
            .get_chain_state(context.config.network)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.block_height, 115);
        assert_eq!(state.block_hash, "0xblock115");
    }

    #[tokio::test]
    async fn test_replayed_contract_events_reach_handlers() {
        let chain = Arc::new(MockChainApi::new());
        chain.set_tip(112);
        for height in 101..=112 {
            let mut txs = vec![coinbase(height, 0)];
            if height == 105 {
                txs.push(propose_call(height, 1, 7));
            }
            chain.put_block(height, txs);
        }
        let context = wired(Arc::clone(&chain)).await;
        seed(&context, 100).await;

        run_monitor(&context).await;

        // The proposal from the replayed block exists.
        let dao = context
            .store
            .get_dao_by_name("facesdao")
            .await
            .unwrap()
            .unwrap();
        let proposal = context
            .store
            .get_proposal_by_key(dao.id, ProposalKind::Action, &ProposalKey::OnChainId(7))
            .await
            .unwrap()
            .expect("replayed proposal exists");
        assert_eq!(proposal.content, "replayed");
    }

    #[tokio::test]
    async fn test_failed_block_skipped_later_blocks_processed() {
        let chain = Arc::new(MockChainApi::new());
        chain.set_tip(115);
        for height in 101..=115 {
            chain.put_block(height, vec![coinbase(height, 0)]);
        }
        chain.fail_block(108);
        let context = wired(Arc::clone(&chain)).await;
        seed(&context, 100).await;

        let execution = run_monitor(&context).await;
        let payload = execution.outcomes[0].payload.as_ref().unwrap();
        let processed = payload["blocks_processed"].as_array().unwrap();
        assert_eq!(processed.len(), 14);
        assert!(!processed.contains(&json!(108)));

        let state = context
            .store
            .get_chain_state(context.config.network)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.block_height, 115);
    }

    #[tokio::test]
    async fn test_monitor_reruns_are_idempotent() {
        let chain = Arc::new(MockChainApi::new());
        chain.set_tip(115);
        for height in 101..=115 {
            let mut txs = vec![coinbase(height, 0)];
            if height == 103 {
                txs.push(propose_call(height, 1, 9));
            }
            chain.put_block(height, txs);
        }
        let context = wired(Arc::clone(&chain)).await;
        seed(&context, 100).await;

        run_monitor(&context).await;
        // Second run: store is at the tip, nothing stale, nothing changes.
        let execution = run_monitor(&context).await;
        let payload = execution.outcomes[0].payload.as_ref().unwrap();
        assert_eq!(payload["is_stale"], false);

        let dao = context
            .store
            .get_dao_by_name("facesdao")
            .await
            .unwrap()
            .unwrap();
        let proposal = context
            .store
            .get_proposal_by_key(dao.id, ProposalKind::Action, &ProposalKey::OnChainId(9))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(proposal.content, "replayed");
    }
}
