//! # In-Memory Store Adapter
//!
//! Backs the store port with `parking_lot`-guarded maps. One write lock
//! per operation gives each port call the single-transaction atomicity
//! the port promises.
//!
//! This is the adapter the default runtime and the test suite use; a
//! relational adapter plugs in behind the same port.

use crate::ports::{ChainStateWrite, Store, VoteWrite};
use crate::records::{
    NewDao, NewExtension, NewProposal, NewToken, NewTrade, NewVote, ProposalUpdate, TokenUpdate,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{
    amounts, ChainState, ContractPrincipal, Dao, DaoId, Extension, ExtensionId, Network, Proposal,
    ProposalId, ProposalKey, ProposalKind, ProposalStatus, StoreError, Token, TokenId, TokenTrade,
    Vote, VoteId,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Default)]
struct Inner {
    daos: HashMap<DaoId, Dao>,
    dao_names: HashMap<String, DaoId>,

    extensions: HashMap<ExtensionId, Extension>,
    extensions_by_principal: HashMap<String, ExtensionId>,

    tokens: HashMap<TokenId, Token>,
    tokens_by_principal: HashMap<String, TokenId>,

    proposals: HashMap<ProposalId, Proposal>,

    votes: HashMap<VoteId, Vote>,
    vote_keys: HashMap<(ProposalId, String, String), VoteId>,

    trades: Vec<TokenTrade>,
    trade_keys: HashSet<(String, u32)>,

    chain_states: HashMap<Network, ChainState>,
}

/// In-memory implementation of the store port.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of proposals held (test visibility).
    #[must_use]
    pub fn proposal_count(&self) -> usize {
        self.inner.read().proposals.len()
    }

    /// Number of votes held (test visibility).
    #[must_use]
    pub fn vote_count(&self) -> usize {
        self.inner.read().votes.len()
    }
}

fn matches_key(proposal: &Proposal, key: &ProposalKey) -> bool {
    match key {
        ProposalKey::OnChainId(id) => proposal.on_chain_id == Some(*id),
        ProposalKey::Principal(p) => proposal.contract_principal.as_ref() == Some(p),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_dao(&self, new: NewDao) -> Result<Dao, StoreError> {
        let mut inner = self.inner.write();
        if inner.dao_names.contains_key(&new.name) {
            return Err(StoreError::Conflict(format!("dao name taken: {}", new.name)));
        }
        let now = Utc::now();
        let dao = Dao {
            id: DaoId::new(),
            name: new.name,
            mission: new.mission,
            description: new.description,
            is_deployed: new.is_deployed,
            is_broadcasted: new.is_broadcasted,
            created_at: now,
            updated_at: now,
        };
        inner.dao_names.insert(dao.name.clone(), dao.id);
        inner.daos.insert(dao.id, dao.clone());
        Ok(dao)
    }

    async fn get_dao_by_id(&self, id: DaoId) -> Result<Option<Dao>, StoreError> {
        Ok(self.inner.read().daos.get(&id).cloned())
    }

    async fn get_dao_by_name(&self, name: &str) -> Result<Option<Dao>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .dao_names
            .get(name)
            .and_then(|id| inner.daos.get(id))
            .cloned())
    }

    async fn create_extension(&self, new: NewExtension) -> Result<Extension, StoreError> {
        let mut inner = self.inner.write();
        let principal_key = new.contract_principal.as_str().to_string();
        if inner.extensions_by_principal.contains_key(&principal_key) {
            return Err(StoreError::Conflict(format!(
                "extension exists for {principal_key}"
            )));
        }
        let extension = Extension {
            id: ExtensionId::new(),
            dao_id: new.dao_id,
            type_tag: new.type_tag,
            subtype: new.subtype,
            contract_principal: new.contract_principal,
            tx_id: new.tx_id,
            status: new.status,
            created_at: Utc::now(),
        };
        inner
            .extensions_by_principal
            .insert(principal_key, extension.id);
        inner.extensions.insert(extension.id, extension.clone());
        Ok(extension)
    }

    async fn get_extension_by_principal(
        &self,
        principal: &ContractPrincipal,
    ) -> Result<Option<Extension>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .extensions_by_principal
            .get(principal.as_str())
            .and_then(|id| inner.extensions.get(id))
            .cloned())
    }

    async fn list_extensions_by_dao(&self, dao_id: DaoId) -> Result<Vec<Extension>, StoreError> {
        let inner = self.inner.read();
        let mut extensions: Vec<Extension> = inner
            .extensions
            .values()
            .filter(|e| e.dao_id == dao_id)
            .cloned()
            .collect();
        extensions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(extensions)
    }

    async fn create_token(&self, new: NewToken) -> Result<Token, StoreError> {
        if new.decimals > 18 {
            return Err(StoreError::Conflict(format!(
                "token decimals out of range: {}",
                new.decimals
            )));
        }
        let mut inner = self.inner.write();
        let principal_key = new.contract_principal.as_str().to_string();
        if inner.tokens_by_principal.contains_key(&principal_key) {
            return Err(StoreError::Conflict(format!(
                "token exists for {principal_key}"
            )));
        }
        let token = Token {
            id: TokenId::new(),
            dao_id: new.dao_id,
            contract_principal: new.contract_principal,
            tx_id: new.tx_id,
            name: new.name,
            description: new.description,
            symbol: new.symbol,
            decimals: new.decimals,
            max_supply: new.max_supply,
            uri: new.uri,
            image_url: new.image_url,
            x_url: new.x_url,
            telegram_url: new.telegram_url,
            website_url: new.website_url,
            status: new.status,
            last_trade_tx_id: None,
            last_traded_at: None,
            created_at: Utc::now(),
        };
        inner.tokens_by_principal.insert(principal_key, token.id);
        inner.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn get_token_by_principal(
        &self,
        principal: &ContractPrincipal,
    ) -> Result<Option<Token>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .tokens_by_principal
            .get(principal.as_str())
            .and_then(|id| inner.tokens.get(id))
            .cloned())
    }

    async fn update_token(&self, id: TokenId, update: TokenUpdate) -> Result<Token, StoreError> {
        let mut inner = self.inner.write();
        let token = inner
            .tokens
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("token {id}")))?;
        if let Some(uri) = update.uri {
            token.uri = Some(uri);
        }
        if let Some(image_url) = update.image_url {
            token.image_url = Some(image_url);
        }
        if let Some(status) = update.status {
            token.status = status;
        }
        if let Some(tx_id) = update.last_trade_tx_id {
            token.last_trade_tx_id = Some(tx_id);
        }
        if let Some(at) = update.last_traded_at {
            token.last_traded_at = Some(at);
        }
        Ok(token.clone())
    }

    async fn create_proposal(&self, new: NewProposal) -> Result<Proposal, StoreError> {
        match new.kind {
            ProposalKind::Action if new.on_chain_id.is_none() => {
                return Err(StoreError::Conflict(
                    "action proposal requires an on-chain id".to_string(),
                ));
            }
            ProposalKind::Core if new.contract_principal.is_none() => {
                return Err(StoreError::Conflict(
                    "core proposal requires a contract principal".to_string(),
                ));
            }
            _ => {}
        }
        let mut inner = self.inner.write();
        let duplicate = inner.proposals.values().any(|p| {
            p.dao_id == new.dao_id
                && p.kind == new.kind
                && ((new.on_chain_id.is_some() && p.on_chain_id == new.on_chain_id)
                    || (new.contract_principal.is_some()
                        && p.contract_principal == new.contract_principal))
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "proposal exists in dao {}",
                new.dao_id
            )));
        }
        let now = Utc::now();
        let proposal = Proposal {
            id: ProposalId::new(),
            dao_id: new.dao_id,
            kind: new.kind,
            on_chain_id: new.on_chain_id,
            contract_principal: new.contract_principal,
            title: new.title,
            content: new.content,
            creator: new.creator,
            tx_id: new.tx_id,
            status: new.status,
            evaluation_score: None,
            evaluation_decision: None,
            evaluation_flags: Vec::new(),
            evaluation_summary: None,
            votes_for: amounts::zero(),
            votes_against: amounts::zero(),
            liquid_tokens: None,
            passed: None,
            executed: None,
            met_quorum: None,
            met_threshold: None,
            concluded_by: None,
            burn_start_height: None,
            burn_end_height: None,
            created_at: new.created_at.unwrap_or(now),
            updated_at: now,
        };
        inner.proposals.insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn get_proposal_by_key(
        &self,
        dao_id: DaoId,
        kind: ProposalKind,
        key: &ProposalKey,
    ) -> Result<Option<Proposal>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .proposals
            .values()
            .find(|p| p.dao_id == dao_id && p.kind == kind && matches_key(p, key))
            .cloned())
    }

    async fn update_proposal(
        &self,
        id: ProposalId,
        update: ProposalUpdate,
    ) -> Result<Proposal, StoreError> {
        let mut inner = self.inner.write();
        let proposal = inner
            .proposals
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))?;

        if let Some(title) = update.title {
            proposal.title = title;
        }
        if let Some(content) = update.content {
            proposal.content = content;
        }
        if let Some(creator) = update.creator {
            proposal.creator = creator;
        }
        if let Some(tx_id) = update.tx_id {
            proposal.tx_id = tx_id;
        }
        if let Some(status) = update.status {
            proposal.status = status;
        }
        if let Some(score) = update.evaluation_score {
            proposal.evaluation_score = Some(score);
        }
        if let Some(decision) = update.evaluation_decision {
            proposal.evaluation_decision = Some(decision);
        }
        if let Some(flags) = update.evaluation_flags {
            proposal.evaluation_flags = flags;
        }
        if let Some(summary) = update.evaluation_summary {
            proposal.evaluation_summary = Some(summary);
        }
        if let Some(votes_for) = update.votes_for {
            proposal.votes_for = votes_for;
        }
        if let Some(votes_against) = update.votes_against {
            proposal.votes_against = votes_against;
        }
        if let Some(liquid_tokens) = update.liquid_tokens {
            proposal.liquid_tokens = Some(liquid_tokens);
        }
        if let Some(passed) = update.passed {
            proposal.passed = Some(passed);
        }
        if let Some(executed) = update.executed {
            proposal.executed = Some(executed);
        }
        if let Some(met_quorum) = update.met_quorum {
            proposal.met_quorum = Some(met_quorum);
        }
        if let Some(met_threshold) = update.met_threshold {
            proposal.met_threshold = Some(met_threshold);
        }
        if let Some(concluded_by) = update.concluded_by {
            proposal.concluded_by = Some(concluded_by);
        }
        if let Some(start) = update.burn_start_height {
            proposal.burn_start_height = Some(start);
        }
        if let Some(end) = update.burn_end_height {
            proposal.burn_end_height = Some(end);
        }
        proposal.updated_at = Utc::now();
        Ok(proposal.clone())
    }

    async fn increment_proposal_tallies(
        &self,
        id: ProposalId,
        value: bool,
        amount: &str,
    ) -> Result<Proposal, StoreError> {
        let mut inner = self.inner.write();
        let proposal = inner
            .proposals
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))?;
        let target = if value {
            &mut proposal.votes_for
        } else {
            &mut proposal.votes_against
        };
        *target = amounts::add(target, amount)
            .map_err(|e| StoreError::Conflict(format!("invalid tally amount: {e}")))?;
        proposal.updated_at = Utc::now();
        Ok(proposal.clone())
    }

    async fn list_unevaluated_proposals(&self, limit: usize) -> Result<Vec<Proposal>, StoreError> {
        let inner = self.inner.read();
        let mut pending: Vec<Proposal> = inner
            .proposals
            .values()
            .filter(|p| p.status == ProposalStatus::Active && p.evaluation_decision.is_none())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn create_vote(&self, new: NewVote) -> Result<VoteWrite, StoreError> {
        let mut inner = self.inner.write();
        let key = (new.proposal_id, new.voter.clone(), new.tx_id.clone());
        if let Some(existing_id) = inner.vote_keys.get(&key) {
            let existing = inner
                .votes
                .get(existing_id)
                .cloned()
                .ok_or_else(|| StoreError::Unavailable("vote index out of sync".to_string()))?;
            debug!(proposal_id = %new.proposal_id, voter = %new.voter, "duplicate vote ignored");
            return Ok(VoteWrite::Duplicate(existing));
        }
        let vote = Vote {
            id: VoteId::new(),
            proposal_id: new.proposal_id,
            voter: new.voter,
            contract_caller: new.contract_caller,
            tx_sender: new.tx_sender,
            amount: new.amount,
            value: new.value,
            tx_id: new.tx_id,
            created_at: Utc::now(),
        };
        inner.vote_keys.insert(key, vote.id);
        inner.votes.insert(vote.id, vote.clone());
        Ok(VoteWrite::Inserted(vote))
    }

    async fn list_votes_by_proposal(&self, id: ProposalId) -> Result<Vec<Vote>, StoreError> {
        let inner = self.inner.read();
        let mut votes: Vec<Vote> = inner
            .votes
            .values()
            .filter(|v| v.proposal_id == id)
            .cloned()
            .collect();
        votes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(votes)
    }

    async fn record_trade(&self, new: NewTrade) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        let key = (new.tx_id.clone(), new.event_index);
        if !inner.trade_keys.insert(key) {
            return Ok(false);
        }
        inner.trades.push(TokenTrade {
            token_contract: new.token_contract,
            side: new.side,
            trader: new.trader,
            amount: new.amount,
            tx_id: new.tx_id,
            event_index: new.event_index,
            recorded_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_trades_by_token(
        &self,
        token_contract: &str,
    ) -> Result<Vec<TokenTrade>, StoreError> {
        Ok(self
            .inner
            .read()
            .trades
            .iter()
            .filter(|t| t.token_contract == token_contract)
            .cloned()
            .collect())
    }

    async fn get_chain_state(&self, network: Network) -> Result<Option<ChainState>, StoreError> {
        Ok(self.inner.read().chain_states.get(&network).cloned())
    }

    async fn upsert_chain_state(
        &self,
        network: Network,
        height: u64,
        hash: &str,
    ) -> Result<ChainStateWrite, StoreError> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.chain_states.get(&network) {
            if height < existing.block_height {
                return Ok(ChainStateWrite::RejectedRegression {
                    stored: existing.block_height,
                    offered: height,
                });
            }
        }
        inner.chain_states.insert(
            network,
            ChainState {
                network,
                block_height: height,
                block_hash: hash.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(ChainStateWrite::Applied { height })
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        // The lock being acquirable is all there is to probe in memory.
        let _ = self.inner.read();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ContractStatus;

    fn new_dao() -> NewDao {
        NewDao {
            name: "facesdao".to_string(),
            mission: "put a face on everything".to_string(),
            description: "test dao".to_string(),
            is_deployed: true,
            is_broadcasted: true,
        }
    }

    fn new_extension(dao_id: DaoId, principal: &str) -> NewExtension {
        NewExtension {
            dao_id,
            type_tag: "EXTENSIONS".to_string(),
            subtype: "ACTION_PROPOSALS".to_string(),
            contract_principal: ContractPrincipal::parse(principal).unwrap(),
            tx_id: "0xdeploy".to_string(),
            status: ContractStatus::Deployed,
        }
    }

    fn new_action_proposal(dao_id: DaoId, on_chain_id: u64) -> NewProposal {
        NewProposal {
            dao_id,
            kind: ProposalKind::Action,
            on_chain_id: Some(on_chain_id),
            contract_principal: None,
            title: String::new(),
            content: "do the thing".to_string(),
            creator: "SP000A".to_string(),
            tx_id: "0xabc".to_string(),
            status: ProposalStatus::Active,
            created_at: None,
        }
    }

    fn new_vote(proposal_id: ProposalId, voter: &str, tx_id: &str, value: bool) -> NewVote {
        NewVote {
            proposal_id,
            voter: voter.to_string(),
            contract_caller: "SP000.agent".to_string(),
            tx_sender: voter.to_string(),
            amount: "1000".to_string(),
            value,
            tx_id: tx_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_dao_name_unique() {
        let store = MemoryStore::new();
        store.create_dao(new_dao()).await.unwrap();
        assert!(matches!(
            store.create_dao(new_dao()).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_extension_lookup_by_principal() {
        let store = MemoryStore::new();
        let dao = store.create_dao(new_dao()).await.unwrap();
        store
            .create_extension(new_extension(dao.id, "SP123.action-proposals"))
            .await
            .unwrap();

        let principal = ContractPrincipal::parse("SP123.action-proposals").unwrap();
        let found = store
            .get_extension_by_principal(&principal)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.dao_id, dao.id);
    }

    #[tokio::test]
    async fn test_proposal_upsert_key_uniqueness() {
        let store = MemoryStore::new();
        let dao = store.create_dao(new_dao()).await.unwrap();
        store
            .create_proposal(new_action_proposal(dao.id, 42))
            .await
            .unwrap();
        assert!(store
            .create_proposal(new_action_proposal(dao.id, 42))
            .await
            .is_err());
        // Same id, different kind key space: core proposal with principal is fine.
        let core = NewProposal {
            kind: ProposalKind::Core,
            on_chain_id: None,
            contract_principal: Some(ContractPrincipal::parse("SP123.prop").unwrap()),
            ..new_action_proposal(dao.id, 42)
        };
        assert!(store.create_proposal(core).await.is_ok());
    }

    #[tokio::test]
    async fn test_proposal_kind_requires_matching_key() {
        let store = MemoryStore::new();
        let dao = store.create_dao(new_dao()).await.unwrap();
        let mut bad = new_action_proposal(dao.id, 1);
        bad.on_chain_id = None;
        assert!(store.create_proposal(bad).await.is_err());
    }

    #[tokio::test]
    async fn test_vote_dedup_on_triple() {
        let store = MemoryStore::new();
        let dao = store.create_dao(new_dao()).await.unwrap();
        let proposal = store
            .create_proposal(new_action_proposal(dao.id, 7))
            .await
            .unwrap();

        let first = store
            .create_vote(new_vote(proposal.id, "SP000B", "0x1", true))
            .await
            .unwrap();
        assert!(first.inserted());

        let replay = store
            .create_vote(new_vote(proposal.id, "SP000B", "0x1", true))
            .await
            .unwrap();
        assert!(!replay.inserted());
        assert_eq!(store.vote_count(), 1);

        // Same voter, different transaction: a new row.
        let second = store
            .create_vote(new_vote(proposal.id, "SP000B", "0x2", true))
            .await
            .unwrap();
        assert!(second.inserted());
    }

    #[tokio::test]
    async fn test_tally_increment() {
        let store = MemoryStore::new();
        let dao = store.create_dao(new_dao()).await.unwrap();
        let proposal = store
            .create_proposal(new_action_proposal(dao.id, 7))
            .await
            .unwrap();

        let after = store
            .increment_proposal_tallies(proposal.id, true, "1000")
            .await
            .unwrap();
        assert_eq!(after.votes_for, "1000");
        let after = store
            .increment_proposal_tallies(proposal.id, false, "500")
            .await
            .unwrap();
        assert_eq!(after.votes_against, "500");
        assert_eq!(after.votes_for, "1000");
    }

    #[tokio::test]
    async fn test_chain_state_monotonic() {
        let store = MemoryStore::new();
        let write = store
            .upsert_chain_state(Network::Testnet, 100, "0xaaa")
            .await
            .unwrap();
        assert!(write.applied());

        // Regression rejected.
        let write = store
            .upsert_chain_state(Network::Testnet, 99, "0xbbb")
            .await
            .unwrap();
        assert_eq!(
            write,
            ChainStateWrite::RejectedRegression {
                stored: 100,
                offered: 99
            }
        );

        // Equal height refreshes.
        let write = store
            .upsert_chain_state(Network::Testnet, 100, "0xccc")
            .await
            .unwrap();
        assert!(write.applied());
        let state = store
            .get_chain_state(Network::Testnet)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.block_height, 100);
        assert_eq!(state.block_hash, "0xccc");
    }

    #[tokio::test]
    async fn test_networks_are_isolated() {
        let store = MemoryStore::new();
        store
            .upsert_chain_state(Network::Testnet, 100, "0xaaa")
            .await
            .unwrap();
        assert!(store
            .get_chain_state(Network::Mainnet)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_trade_dedup() {
        let store = MemoryStore::new();
        let trade = NewTrade {
            token_contract: "SP123.token".to_string(),
            side: shared_types::TradeSide::Buy,
            trader: "SP000B".to_string(),
            amount: "250".to_string(),
            tx_id: "0x9".to_string(),
            event_index: 3,
        };
        assert!(store.record_trade(trade.clone()).await.unwrap());
        assert!(!store.record_trade(trade).await.unwrap());
        assert_eq!(
            store.list_trades_by_token("SP123.token").await.unwrap().len(),
            1
        );
    }

    proptest::proptest! {
        /// Whatever order height updates arrive in, the stored height is
        /// the running maximum and never regresses.
        #[test]
        fn prop_chain_state_height_monotone(heights in proptest::collection::vec(0u64..10_000, 1..64)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let store = MemoryStore::new();
                let mut max_seen = 0u64;
                for (i, height) in heights.iter().enumerate() {
                    let _ = store
                        .upsert_chain_state(Network::Testnet, *height, &format!("0x{i}"))
                        .await
                        .unwrap();
                    max_seen = max_seen.max(*height);
                    let stored = store
                        .get_chain_state(Network::Testnet)
                        .await
                        .unwrap()
                        .unwrap()
                        .block_height;
                    assert_eq!(stored, max_seen);
                }
            });
        }
    }

    #[tokio::test]
    async fn test_list_unevaluated_proposals_bounded() {
        let store = MemoryStore::new();
        let dao = store.create_dao(new_dao()).await.unwrap();
        for i in 0..5 {
            store
                .create_proposal(new_action_proposal(dao.id, i))
                .await
                .unwrap();
        }
        let pending = store.list_unevaluated_proposals(3).await.unwrap();
        assert_eq!(pending.len(), 3);

        // Evaluated proposals drop out.
        let update = ProposalUpdate {
            evaluation_decision: Some(true),
            ..ProposalUpdate::default()
        };
        store.update_proposal(pending[0].id, update).await.unwrap();
        let pending = store.list_unevaluated_proposals(10).await.unwrap();
        assert_eq!(pending.len(), 4);
    }
}
