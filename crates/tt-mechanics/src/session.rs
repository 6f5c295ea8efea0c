//! An in-process combat session shared by several clients.
//!
//! `CombatSession` owns the record store, the chat log and the random source
//! for one combat. Every action is attributed to a connected client; after
//! each write the session delivers the queued change events to every
//! client's [`SpeedDieSynchronizer`] until the queue is empty, the way a
//! shared world would broadcast them.

use tracing::{info, warn};
use tt_core::{
    Character, CharacterId, ClientId, Combat, CombatId, Combatant, CombatantId, CoreError,
    MemoryStore, NewCombatant, PlacementId, RecordStore, Skill,
};

use crate::chat::{ChatEntry, ChatLog, ChatSink, MessageId};
use crate::combat::initiative::{InitiativeRoll, roll_initiative};
use crate::combat::sync::{SpeedDieSynchronizer, SyncOutcome};
use crate::combat::{self, TurnAdvance};
use crate::config::MechanicsConfig;
use crate::dice::{RandomSource, StdDice};
use crate::error::{MechError, MechResult};
use crate::reroll::{RerollDescriptor, RolledDie};
use crate::skill::{self, DieOptions, SkillRoll};
use crate::status::{self, StatusFiring};

/// What a connected client may see. Both roles run the same sync rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientRole {
    /// A player controlling some characters.
    Player,
    /// A game master. Several may be connected at once.
    GameMaster,
}

#[derive(Debug)]
struct Client {
    role: ClientRole,
    sync: SpeedDieSynchronizer,
}

/// One combat shared by any number of clients.
pub struct CombatSession {
    store: MemoryStore,
    chat: ChatLog,
    dice: Box<dyn RandomSource>,
    config: MechanicsConfig,
    combat: CombatId,
    clients: Vec<Client>,
}

impl CombatSession {
    /// Create a session with dice seeded from the config.
    pub fn new(config: MechanicsConfig) -> MechResult<Self> {
        let dice = Box::new(StdDice::from_seed_option(config.seed));
        Self::with_dice(config, dice)
    }

    /// Create a session with an explicit random source.
    pub fn with_dice(config: MechanicsConfig, dice: Box<dyn RandomSource>) -> MechResult<Self> {
        config.validate()?;
        let mut store = MemoryStore::new();
        let combat = store.create_combat(Combat::new(), ClientId::new())?;
        store.drain_events();
        Ok(Self {
            store,
            chat: ChatLog::new(),
            dice,
            config,
            combat,
            clients: Vec::new(),
        })
    }

    /// Connect a client and return its identity.
    pub fn connect(&mut self, role: ClientRole) -> ClientId {
        let id = ClientId::new();
        self.clients.push(Client {
            role,
            sync: SpeedDieSynchronizer::new(id),
        });
        info!(client = %id, ?role, "client connected");
        id
    }

    /// Connected clients and their roles.
    pub fn clients(&self) -> impl Iterator<Item = (ClientId, ClientRole)> + '_ {
        self.clients.iter().map(|c| (c.sync.local(), c.role))
    }

    /// The record store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// The chat log.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// The session configuration.
    pub fn config(&self) -> &MechanicsConfig {
        &self.config
    }

    /// The combat id.
    pub fn combat_id(&self) -> CombatId {
        self.combat
    }

    /// The combat record.
    pub fn combat(&self) -> MechResult<&Combat> {
        Ok(self
            .store
            .combat(self.combat)
            .ok_or(CoreError::CombatNotFound(self.combat))?)
    }

    /// A character record.
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.store.character(id)
    }

    /// Entries in turn order.
    pub fn turn_order(&self) -> Vec<&Combatant> {
        combat::turn_order(&self.store, self.combat)
    }

    /// The entry whose turn it is.
    pub fn current_entry(&self) -> MechResult<Option<&Combatant>> {
        combat::current_entry(&self.store, self.combat)
    }

    fn check_client(&self, client: ClientId) -> MechResult<()> {
        if self.clients.iter().any(|c| c.sync.local() == client) {
            Ok(())
        } else {
            Err(MechError::UnknownClient(client))
        }
    }

    /// Deliver queued change events to every client until none are left.
    fn pump(&mut self) -> SyncOutcome {
        let mut total = SyncOutcome::default();
        loop {
            let events = self.store.drain_events();
            if events.is_empty() {
                break;
            }
            for event in &events {
                for client in &self.clients {
                    match client.sync.handle(&mut self.store, event) {
                        Ok(outcome) => {
                            total.created.extend(outcome.created);
                            total.removed.extend(outcome.removed);
                        }
                        Err(e) => warn!(client = %client.sync.local(), error = %e, "sync failed"),
                    }
                }
            }
        }
        total
    }

    /// Add a character record.
    pub fn add_character(&mut self, client: ClientId, character: Character) -> MechResult<CharacterId> {
        self.check_client(client)?;
        let id = self.store.insert_character(character, client)?;
        self.pump();
        Ok(id)
    }

    /// Replace a character record. A changed die count is reconciled by the
    /// client that made the change.
    pub fn update_character(&mut self, client: ClientId, character: Character) -> MechResult<SyncOutcome> {
        self.check_client(client)?;
        self.store.update_character(character, client)?;
        Ok(self.pump())
    }

    /// Put a character into the combat at a placement. Clones for extra
    /// speed dice follow.
    pub fn place(
        &mut self,
        client: ClientId,
        character: CharacterId,
        placement: PlacementId,
    ) -> MechResult<CombatantId> {
        self.check_client(client)?;
        let name = find_character(&self.store, character)?.name.clone();
        let ids = self.store.create_combatants(
            self.combat,
            vec![NewCombatant::primary(character, placement, name)],
            client,
        )?;
        self.pump();
        ids.into_iter()
            .next()
            .ok_or_else(|| MechError::MissingItem(format!("new entry for character {character}")))
    }

    /// Put a character into the combat at a fresh placement.
    pub fn add_to_combat(&mut self, client: ClientId, character: CharacterId) -> MechResult<CombatantId> {
        self.place(client, character, PlacementId::new())
    }

    /// Remove an entry. Removing a primary takes its placement's clones too.
    pub fn remove_entry(&mut self, client: ClientId, entry: CombatantId) -> MechResult<()> {
        self.check_client(client)?;
        if self.store.delete_combatants(&[entry], client).is_empty() {
            return Err(MechError::MissingEntry(entry));
        }
        self.pump();
        Ok(())
    }

    /// Roll initiative for some entries.
    pub fn roll_initiative(
        &mut self,
        client: ClientId,
        entries: &[CombatantId],
    ) -> MechResult<Vec<InitiativeRoll>> {
        self.check_client(client)?;
        let rolls = roll_initiative(
            &mut self.store,
            &mut self.chat,
            self.dice.as_mut(),
            &self.config,
            entries,
            client,
        )?;
        self.pump();
        Ok(rolls)
    }

    /// Roll initiative for every entry that has none.
    pub fn roll_unrolled(&mut self, client: ClientId) -> MechResult<Vec<InitiativeRoll>> {
        let pending: Vec<CombatantId> = self
            .store
            .combatants(self.combat)
            .into_iter()
            .filter(|e| e.initiative.is_none())
            .map(|e| e.id)
            .collect();
        self.roll_initiative(client, &pending)
    }

    /// Start round 1.
    pub fn start(&mut self, client: ClientId) -> MechResult<()> {
        self.check_client(client)?;
        combat::start_combat(&mut self.store, self.combat, client)?;
        self.pump();
        Ok(())
    }

    /// Advance the turn.
    pub fn next_turn(&mut self, client: ClientId) -> MechResult<TurnAdvance> {
        self.check_client(client)?;
        let advance = combat::next_turn(&mut self.store, self.combat, client)?;
        if let TurnAdvance::NewRound { round, .. } = advance {
            self.chat
                .append(ChatEntry::content("Combat", format!("Round {round}")));
        }
        self.pump();
        Ok(advance)
    }

    /// Flip an entry's used mark.
    pub fn toggle_used(&mut self, client: ClientId, entry: CombatantId) -> MechResult<bool> {
        self.check_client(client)?;
        let used = combat::toggle_used(&mut self.store, entry, client)?;
        self.pump();
        Ok(used)
    }

    /// Roll a skill and publish it.
    pub fn roll_skill(
        &mut self,
        client: ClientId,
        character: CharacterId,
        skill_name: &str,
        options: &[DieOptions],
    ) -> MechResult<(MessageId, SkillRoll)> {
        self.check_client(client)?;
        let sheet = find_character(&self.store, character)?;
        let found = find_skill(sheet, skill_name)?;
        let roll = skill::roll_skill(sheet, found, options, self.dice.as_mut());
        let entry = ChatEntry::flavor(sheet.name.clone(), roll.render())
            .spoken_by(character)
            .with_rolls(roll.rolled());
        let id = self.chat.append(entry);
        Ok((id, roll))
    }

    /// Publish a skill's dice without rolling.
    pub fn declare_skill(
        &mut self,
        client: ClientId,
        character: CharacterId,
        skill_name: &str,
    ) -> MechResult<MessageId> {
        self.check_client(client)?;
        let sheet = find_character(&self.store, character)?;
        let found = find_skill(sheet, skill_name)?;
        let entry = ChatEntry::content(sheet.name.clone(), skill::declare_skill(found))
            .spoken_by(character);
        Ok(self.chat.append(entry))
    }

    /// Roll one die of a skill and publish it.
    pub fn roll_die(
        &mut self,
        client: ClientId,
        character: CharacterId,
        skill_name: &str,
        index: usize,
    ) -> MechResult<(MessageId, RolledDie)> {
        self.check_client(client)?;
        let sheet = find_character(&self.store, character)?;
        let found = find_skill(sheet, skill_name)?;
        let rolled = skill::roll_die(sheet, found, index, self.dice.as_mut())?;
        let entry = ChatEntry::flavor(sheet.name.clone(), format!("{}: {}", found.name, rolled.trace()))
            .spoken_by(character)
            .with_rolls(vec![rolled.clone()]);
        Ok((self.chat.append(entry), rolled))
    }

    /// Roll a descriptor again and publish the new result.
    pub fn reroll(
        &mut self,
        client: ClientId,
        descriptor: &RerollDescriptor,
    ) -> MechResult<(MessageId, RolledDie)> {
        self.check_client(client)?;
        let rolled = descriptor.roll(self.dice.as_mut())?;
        let entry = ChatEntry::flavor(
            descriptor.source_name.clone(),
            format!("Reroll: {}", rolled.trace()),
        )
        .with_rolls(vec![rolled.clone()]);
        Ok((self.chat.append(entry), rolled))
    }

    /// Fire a status on a character and publish the effect.
    pub fn fire_status(
        &mut self,
        client: ClientId,
        character: CharacterId,
        status_name: &str,
        rule: Option<usize>,
    ) -> MechResult<StatusFiring> {
        self.check_client(client)?;
        let mut sheet = find_character(&self.store, character)?.clone();
        let status_id = sheet
            .status_by_name(status_name)
            .map(|s| s.id)
            .ok_or_else(|| MechError::MissingItem(format!("status '{status_name}' on {}", sheet.name)))?;
        let fired = status::fire_status(&mut sheet, status_id, rule)?;
        let text = fired.render(&sheet.name);
        let speaker = sheet.name.clone();
        self.store.update_character(sheet, client)?;
        self.chat
            .append(ChatEntry::content(speaker, text).spoken_by(character));
        self.pump();
        Ok(fired)
    }
}

fn find_character(store: &MemoryStore, id: CharacterId) -> MechResult<&Character> {
    store
        .character(id)
        .ok_or_else(|| MechError::MissingItem(format!("character {id}")))
}

fn find_skill<'a>(sheet: &'a Character, name: &str) -> MechResult<&'a Skill> {
    sheet
        .skill_by_name(name)
        .ok_or_else(|| MechError::MissingItem(format!("skill '{name}' on {}", sheet.name)))
}
