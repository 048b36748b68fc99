// crates/zwave-rs/src/node/mod.rs
pub mod command_class;
pub mod stage;

pub use command_class::{CommandClassId, CommandClassInfo, CommandClassRegistry};
pub use stage::{NodeStage, STAGE_TABLE};

use crate::hal::ZWaveError;
use crate::types::NodeId;
use log::{error, info, warn};

/// Manufacturer specific report contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerInfo {
    pub manufacturer_id: u16,
    pub product_type: u16,
    pub product_id: u16,
}

/// Device class triplet from the protocol information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceClass {
    pub basic: u8,
    pub generic: u8,
    pub specific: u8,
}

/// One device on the mesh, as seen by the controller.
#[derive(Debug, Clone)]
pub struct ZWaveNode {
    id: NodeId,
    stage: NodeStage,
    /// Stage to return to when a DEAD node answers again.
    stage_before_dead: Option<NodeStage>,
    listening: bool,
    frequently_listening: bool,
    asleep: bool,
    resend_count: u32,
    receive_count: u32,
    device_class: DeviceClass,
    manufacturer: Option<ManufacturerInfo>,
    registry: CommandClassRegistry,
}

impl ZWaveNode {
    /// Creates a freshly discovered node. Nodes start out assumed listening
    /// until the protocol information says otherwise.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            stage: NodeStage::EmptyNode,
            stage_before_dead: None,
            listening: true,
            frequently_listening: false,
            asleep: false,
            resend_count: 0,
            receive_count: 0,
            device_class: DeviceClass::default(),
            manufacturer: None,
            registry: CommandClassRegistry::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn stage(&self) -> NodeStage {
        self.stage
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_frequently_listening(&self) -> bool {
        self.frequently_listening
    }

    /// A battery device that must be woken before it can receive.
    pub fn is_sleeping_device(&self) -> bool {
        !self.listening && !self.frequently_listening
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    pub fn set_asleep(&mut self, asleep: bool) {
        self.asleep = asleep;
    }

    pub fn set_listening_flags(&mut self, listening: bool, frequently_listening: bool) {
        self.listening = listening;
        self.frequently_listening = frequently_listening;
    }

    pub fn is_dead(&self) -> bool {
        self.stage == NodeStage::Dead
    }

    pub fn is_failed(&self) -> bool {
        self.stage == NodeStage::Failed
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead() && !self.is_failed()
    }

    pub fn resend_count(&self) -> u32 {
        self.resend_count
    }

    pub fn increment_resend_count(&mut self) -> u32 {
        self.resend_count = self.resend_count.saturating_add(1);
        self.resend_count
    }

    pub fn reset_resend_count(&mut self) {
        self.resend_count = 0;
    }

    pub fn receive_count(&self) -> u32 {
        self.receive_count
    }

    pub fn increment_receive_count(&mut self) {
        self.receive_count = self.receive_count.saturating_add(1);
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn set_device_class(&mut self, device_class: DeviceClass) {
        self.device_class = device_class;
    }

    pub fn manufacturer(&self) -> Option<ManufacturerInfo> {
        self.manufacturer
    }

    pub fn set_manufacturer(&mut self, info: ManufacturerInfo) {
        self.manufacturer = Some(info);
    }

    /// Moves the interview forward.
    ///
    /// Stages only advance, except for an explicit reset to EMPTYNODE or INIT.
    /// DEAD and FAILED are entered through [`Self::set_dead`] and [`Self::set_failed`].
    pub fn set_stage(&mut self, stage: NodeStage) -> Result<(), ZWaveError> {
        if matches!(stage, NodeStage::Dead | NodeStage::Failed) || !self.is_alive() {
            return Err(ZWaveError::InvalidStageTransition);
        }
        let reset = matches!(stage, NodeStage::EmptyNode | NodeStage::Init);
        let from_init = self.stage == NodeStage::Init;
        if !reset && !from_init && stage.rank() < self.stage.rank() {
            warn!(
                "NODE {}: refusing to move back from {:?} to {:?}",
                self.id, self.stage, stage
            );
            return Err(ZWaveError::InvalidStageTransition);
        }
        if stage != self.stage {
            info!("NODE {}: stage {:?} -> {:?}", self.id, self.stage, stage);
        }
        self.stage = stage;
        Ok(())
    }

    /// Marks the node DEAD, remembering where it was. Returns false if nothing changed.
    pub fn set_dead(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        warn!("NODE {}: marked DEAD at stage {:?}", self.id, self.stage);
        self.stage_before_dead = Some(self.stage);
        self.stage = NodeStage::Dead;
        true
    }

    /// Marks the node FAILED for the rest of the session. Returns false if it already was.
    pub fn set_failed(&mut self) -> bool {
        if self.is_failed() {
            return false;
        }
        error!("NODE {}: marked FAILED", self.id);
        if self.stage != NodeStage::Dead {
            self.stage_before_dead = Some(self.stage);
        }
        self.stage = NodeStage::Failed;
        true
    }

    /// Brings a DEAD node back to its pre-DEAD stage and clears the resend counter.
    /// Returns the restored stage, or `None` when the node was not DEAD.
    pub fn set_alive(&mut self) -> Option<NodeStage> {
        if !self.is_dead() {
            return None;
        }
        let restored = self.stage_before_dead.take().unwrap_or(NodeStage::EmptyNode);
        info!("NODE {}: risen from the dead, back to {:?}", self.id, restored);
        self.stage = restored;
        self.resend_count = 0;
        Some(restored)
    }

    // --- Command class registry ---

    pub fn registry(&self) -> &CommandClassRegistry {
        &self.registry
    }

    pub fn command_class(&self, id: CommandClassId) -> Option<&CommandClassInfo> {
        self.registry.get(id)
    }

    fn check_registry_writable(&self) -> Result<(), ZWaveError> {
        if self.stage.accepts_capabilities() {
            Ok(())
        } else {
            Err(ZWaveError::RegistryLocked(self.id))
        }
    }

    /// Records support for a class. Returns true when the class was new.
    pub fn add_command_class(&mut self, id: CommandClassId) -> Result<bool, ZWaveError> {
        self.check_registry_writable()?;
        Ok(self.registry.insert(id))
    }

    pub fn set_command_class_version(
        &mut self,
        id: CommandClassId,
        version: u8,
    ) -> Result<(), ZWaveError> {
        self.check_registry_writable()?;
        self.registry.get_mut_or_insert(id).version = version;
        Ok(())
    }

    pub fn set_get_supported(&mut self, id: CommandClassId, supported: bool) -> Result<(), ZWaveError> {
        self.check_registry_writable()?;
        self.registry.get_mut_or_insert(id).get_supported = supported;
        Ok(())
    }
}
