// crates/zwave-rs/src/node/stage.rs
use core::fmt;

/// Interview stages of a node, plus the control states INIT, DEAD and FAILED.
///
/// Ordering comes from [`STAGE_TABLE`], never from declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStage {
    EmptyNode,
    ProtoInfo,
    Ping,
    Details,
    Manufacturer,
    Version,
    AppVersion,
    Endpoints,
    StaticValues,
    /// Stages up to here are restored from persisted configuration.
    SessionStart,
    Neighbors,
    Session,
    DynamicValues,
    Config,
    Done,
    Init,
    Dead,
    Failed,
}

/// Every stage, indexed by rank.
pub const STAGE_TABLE: [NodeStage; 18] = [
    NodeStage::EmptyNode,
    NodeStage::ProtoInfo,
    NodeStage::Ping,
    NodeStage::Details,
    NodeStage::Manufacturer,
    NodeStage::Version,
    NodeStage::AppVersion,
    NodeStage::Endpoints,
    NodeStage::StaticValues,
    NodeStage::SessionStart,
    NodeStage::Neighbors,
    NodeStage::Session,
    NodeStage::DynamicValues,
    NodeStage::Config,
    NodeStage::Done,
    NodeStage::Init,
    NodeStage::Dead,
    NodeStage::Failed,
];

impl NodeStage {
    /// Numeric rank of the stage.
    pub fn rank(&self) -> u8 {
        match self {
            NodeStage::EmptyNode => 0,
            NodeStage::ProtoInfo => 1,
            NodeStage::Ping => 2,
            NodeStage::Details => 3,
            NodeStage::Manufacturer => 4,
            NodeStage::Version => 5,
            NodeStage::AppVersion => 6,
            NodeStage::Endpoints => 7,
            NodeStage::StaticValues => 8,
            NodeStage::SessionStart => 9,
            NodeStage::Neighbors => 10,
            NodeStage::Session => 11,
            NodeStage::DynamicValues => 12,
            NodeStage::Config => 13,
            NodeStage::Done => 14,
            NodeStage::Init => 15,
            NodeStage::Dead => 16,
            NodeStage::Failed => 17,
        }
    }

    /// Looks a stage up by rank.
    pub fn from_rank(rank: u8) -> Option<NodeStage> {
        STAGE_TABLE.get(rank as usize).copied()
    }

    /// The stage ranked exactly one higher. `None` once the interview is DONE.
    pub fn next(&self) -> Option<NodeStage> {
        if *self == NodeStage::Done {
            return None;
        }
        NodeStage::from_rank(self.rank() + 1)
    }

    /// Human readable description.
    pub fn label(&self) -> &'static str {
        match self {
            NodeStage::EmptyNode => "Empty New Node",
            NodeStage::ProtoInfo => "Protocol Information",
            NodeStage::Ping => "Ping Node",
            NodeStage::Details => "Node Information",
            NodeStage::Manufacturer => "Manufacture Name and Product Identification",
            NodeStage::Version => "Command Class Versions",
            NodeStage::AppVersion => "Application Version",
            NodeStage::Endpoints => "Command Class Endpoints",
            NodeStage::StaticValues => "Static Information",
            NodeStage::SessionStart => "Restore Marker",
            NodeStage::Neighbors => "Node Neighbor Information",
            NodeStage::Session => "Infrequently Changed Information",
            NodeStage::DynamicValues => "Frequently Changed Information",
            NodeStage::Config => "Parameter Information",
            NodeStage::Done => "Node Complete",
            NodeStage::Init => "Node Not Started",
            NodeStage::Dead => "Node Dead",
            NodeStage::Failed => "Node Failed",
        }
    }

    /// True for the interview stages (EMPTYNODE through DONE).
    pub fn is_interview(&self) -> bool {
        self.rank() <= NodeStage::Done.rank()
    }

    /// True for stages whose results survive a controller restart.
    pub fn is_restorable(&self) -> bool {
        self.rank() < NodeStage::SessionStart.rank()
    }

    /// The stage a restored node resumes from.
    pub fn restore_point() -> NodeStage {
        NodeStage::SessionStart
    }

    /// True while command class capabilities may still be written.
    pub fn accepts_capabilities(&self) -> bool {
        self.rank() <= NodeStage::Endpoints.rank() || *self == NodeStage::Init
    }
}

impl fmt::Display for NodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
