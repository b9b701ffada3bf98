//! # Proposal Lifecycle Integration
//!
//! Drives the full ingestion path through raw webhook JSON: DAO
//! creation, proposal creation, voting, conclusion, and replays of
//! every payload to prove idempotency end-to-end.

#[cfg(test)]
mod tests {
    use dw_01_store_gateway::Store as _;
    use dw_02_chain_client::{ChainApi, MockChainApi};
    use node_runtime::{AppContext, AppContextBuilder, RuntimeConfig};
    use serde_json::{json, Value};
    use shared_types::{ContractPrincipal, ProposalKey, ProposalKind, ProposalStatus};
    use std::sync::Arc;

    const EXT: &str = "SP2X0TZ59D5SZ8ACQ6YMCHHNR2ZN51Z32E2CJ173.action-proposals-v2";
    const TOKEN: &str = "SP2X0TZ59D5SZ8ACQ6YMCHHNR2ZN51Z32E2CJ173.faces-token";

    async fn wired_context() -> AppContext {
        AppContextBuilder::new(RuntimeConfig::default())
            .with_chain(Arc::new(MockChainApi::new()) as Arc<dyn ChainApi>)
            .build()
            .expect("context wires")
    }

    async fn create_dao(context: &AppContext) -> shared_types::DaoId {
        let response = context
            .dao_webhook
            .process(&json!({
                "name": "facesdao",
                "mission": "a face for everything",
                "contracts": [
                    { "type": "TOKEN", "subtype": "DAO", "contract_principal": TOKEN, "tx_id": "0xt0" },
                    { "type": "EXTENSIONS", "subtype": "ACTION_PROPOSALS", "contract_principal": EXT, "tx_id": "0xt1" }
                ],
                "token_info": { "symbol": "FACE", "decimals": 6, "max_supply": "1000000000" }
            }))
            .await
            .expect("dao webhook parses");
        assert!(response.success);
        let dao = context
            .store
            .get_dao_by_name("facesdao")
            .await
            .unwrap()
            .expect("dao exists");
        dao.id
    }

    fn contract_call_tx(
        hash: &str,
        index: u32,
        method: &str,
        notification: &str,
        payload: Value,
    ) -> Value {
        json!({
            "transaction_identifier": { "hash": hash },
            "metadata": {
                "kind": {
                    "type": "ContractCall",
                    "data": { "contract_identifier": EXT, "method": method, "args": [] }
                },
                "sender": "SP000SENDER",
                "success": true,
                "result": "(ok true)",
                "position": { "index": index },
                "receipt": {
                    "events": [{
                        "type": "SmartContractEvent",
                        "position": { "index": 0 },
                        "data": {
                            "contract_identifier": EXT,
                            "topic": "print",
                            "value": { "notification": notification, "payload": payload }
                        }
                    }]
                }
            },
            "operations": []
        })
    }

    fn block_payload(height: u64, transactions: Vec<Value>) -> Value {
        json!({
            "apply": [{
                "block_identifier": { "hash": format!("0xblock{height}"), "index": height },
                "parent_block_identifier": {
                    "hash": format!("0xblock{}", height - 1),
                    "index": height - 1
                },
                "metadata": { "block_time": 1_700_000_000u64 + height },
                "timestamp": 1_700_000_000u64 + height,
                "transactions": transactions
            }],
            "chainhook": {
                "uuid": "test-hook",
                "is_streaming_blocks": true,
                "predicate": { "scope": "block_height", "higher_than": height - 1 }
            },
            "events": [],
            "rollback": []
        })
    }

    fn propose_payload(height: u64) -> Value {
        block_payload(
            height,
            vec![contract_call_tx(
                "0xcreate42",
                0,
                "propose-action",
                "propose-action",
                json!({ "proposalId": 42, "creator": "SP000A", "parameters": "fund the art bounty" }),
            )],
        )
    }

    fn votes_payload(height: u64) -> Value {
        block_payload(
            height,
            vec![
                contract_call_tx(
                    "0xvoteB",
                    0,
                    "vote-on-proposal",
                    "vote-on-proposal",
                    json!({
                        "proposalId": 42, "voter": "SP000B", "vote": true,
                        "amount": "1000", "contractCaller": EXT, "txSender": "SP000B"
                    }),
                ),
                contract_call_tx(
                    "0xvoteC",
                    1,
                    "vote-on-proposal",
                    "vote-on-proposal",
                    json!({
                        "proposalId": 42, "voter": "SP000C", "vote": false,
                        "amount": "500", "contractCaller": EXT, "txSender": "SP000C"
                    }),
                ),
            ],
        )
    }

    fn conclude_payload(height: u64) -> Value {
        block_payload(
            height,
            vec![contract_call_tx(
                "0xconclude42",
                0,
                "conclude-proposal",
                "conclude-proposal",
                json!({
                    "proposalId": 42, "concludedBy": "SP000D", "executed": true,
                    "metQuorum": true, "metThreshold": true, "passed": true,
                    "votesFor": "1000", "votesAgainst": "500", "liquidTokens": "100000"
                }),
            )],
        )
    }

    async fn proposal_42(context: &AppContext, dao_id: shared_types::DaoId) -> shared_types::Proposal {
        context
            .store
            .get_proposal_by_key(dao_id, ProposalKind::Action, &ProposalKey::OnChainId(42))
            .await
            .unwrap()
            .expect("proposal 42 exists")
    }

    #[tokio::test]
    async fn test_proposal_creation_and_replay() {
        let context = wired_context().await;
        let dao_id = create_dao(&context).await;

        let response = context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["blocks"], 1);
        assert_eq!(data["transactions"], 1);

        let proposal = proposal_42(&context, dao_id).await;
        assert_eq!(proposal.creator, "SP000A");
        assert_eq!(proposal.content, "fund the art bounty");
        assert_eq!(proposal.status, ProposalStatus::Active);
        assert_eq!(proposal.kind, ProposalKind::Action);

        // Replaying the same webhook changes nothing.
        context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();
        let replayed = proposal_42(&context, dao_id).await;
        assert_eq!(replayed.id, proposal.id);
        assert_eq!(replayed.creator, "SP000A");
    }

    #[tokio::test]
    async fn test_vote_tally_and_replay() {
        let context = wired_context().await;
        let dao_id = create_dao(&context).await;
        context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();

        context.chainhook.process(&votes_payload(102)).await.unwrap();
        let proposal = proposal_42(&context, dao_id).await;
        assert_eq!(proposal.votes_for, "1000");
        assert_eq!(proposal.votes_against, "500");
        let votes = context
            .store
            .list_votes_by_proposal(proposal.id)
            .await
            .unwrap();
        assert_eq!(votes.len(), 2);

        // Replay both votes: rows deduplicate, tallies unchanged.
        context.chainhook.process(&votes_payload(102)).await.unwrap();
        let proposal = proposal_42(&context, dao_id).await;
        assert_eq!(proposal.votes_for, "1000");
        assert_eq!(proposal.votes_against, "500");
        assert_eq!(
            context
                .store
                .list_votes_by_proposal(proposal.id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_conclusion_sets_authoritative_state() {
        let context = wired_context().await;
        let dao_id = create_dao(&context).await;
        context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();
        context.chainhook.process(&votes_payload(102)).await.unwrap();

        context
            .chainhook
            .process(&conclude_payload(110))
            .await
            .unwrap();
        let proposal = proposal_42(&context, dao_id).await;
        assert_eq!(proposal.passed, Some(true));
        assert_eq!(proposal.executed, Some(true));
        assert_eq!(proposal.met_quorum, Some(true));
        assert_eq!(proposal.met_threshold, Some(true));
        assert_eq!(proposal.concluded_by.as_deref(), Some("SP000D"));
        assert_eq!(proposal.votes_for, "1000");
        assert_eq!(proposal.votes_against, "500");
        assert_eq!(proposal.liquid_tokens.as_deref(), Some("100000"));
        assert_eq!(proposal.status, ProposalStatus::Concluded);
    }

    #[tokio::test]
    async fn test_block_state_follows_ingested_blocks() {
        let context = wired_context().await;
        create_dao(&context).await;

        context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();
        context.chainhook.process(&votes_payload(102)).await.unwrap();

        let state = context
            .store
            .get_chain_state(context.config.network)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.block_height, 102);

        // Replaying an older block does not regress the height.
        context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();
        let state = context
            .store
            .get_chain_state(context.config.network)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.block_height, 102);
    }

    #[tokio::test]
    async fn test_vote_before_proposal_is_skipped_then_recovered() {
        let context = wired_context().await;
        let dao_id = create_dao(&context).await;

        // Votes arrive first (e.g. out-of-order webhook delivery).
        context.chainhook.process(&votes_payload(102)).await.unwrap();
        assert!(context
            .store
            .get_proposal_by_key(dao_id, ProposalKind::Action, &ProposalKey::OnChainId(42))
            .await
            .unwrap()
            .is_none());

        // The monitor later replays both blocks in order.
        context
            .chainhook
            .process(&propose_payload(101))
            .await
            .unwrap();
        context.chainhook.process(&votes_payload(102)).await.unwrap();
        let proposal = proposal_42(&context, dao_id).await;
        assert_eq!(proposal.votes_for, "1000");
        assert_eq!(proposal.votes_against, "500");
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected() {
        let context = wired_context().await;
        assert!(context
            .chainhook
            .process(&json!({ "not_apply": [] }))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_core_proposal_lifecycle() {
        let context = wired_context().await;
        let dao_id = create_dao(&context).await;
        let core_contract = "SP2X0TZ59D5SZ8ACQ6YMCHHNR2ZN51Z32E2CJ173.upgrade-v3";

        let payload = block_payload(
            101,
            vec![contract_call_tx(
                "0xcore1",
                0,
                "create-proposal",
                "create-proposal",
                json!({ "proposal": core_contract, "creator": "SP000A" }),
            )],
        );
        context.chainhook.process(&payload).await.unwrap();

        let key = ProposalKey::Principal(ContractPrincipal::parse(core_contract).unwrap());
        let proposal = context
            .store
            .get_proposal_by_key(dao_id, ProposalKind::Core, &key)
            .await
            .unwrap()
            .expect("core proposal exists");
        assert_eq!(proposal.kind, ProposalKind::Core);
        assert!(proposal.on_chain_id.is_none());
    }
}
