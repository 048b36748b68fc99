// crates/zwave-rs/src/controller/handlers.rs
//! Per message class handlers, looked up through a static dispatch table.
//!
//! Each handler is a plain function over the network state, the transaction
//! currently on the wire and the incoming frame. It reports what happened to
//! the in-flight transaction through a [`HandlerOutcome`] and leaves queue
//! manipulation to the dispatcher.

use super::events::ControllerEvent;
use super::state::NetworkState;
use super::transaction::{Transaction, TransactionPhase};
use crate::frame::{SerialMessage, TransmissionState};
use crate::hal::ZWaveError;
use crate::node::{CommandClassId, DeviceClass, ManufacturerInfo, NodeStage};
use crate::types::{MessageClass, NODE_BITMASK_SIZE, NodeId};
use alloc::string::String;
use log::{debug, error, info, trace, warn};

const UPDATE_STATE_NODE_INFO_RECEIVED: u8 = 0x84;
const UPDATE_STATE_NODE_INFO_REQ_FAILED: u8 = 0x81;

const WAKE_UP_NOTIFICATION: u8 = 0x07;
const MANUFACTURER_SPECIFIC_REPORT: u8 = 0x05;
const VERSION_COMMAND_CLASS_REPORT: u8 = 0x14;

/// What an incoming frame means for the in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The frame does not concern the in-flight transaction.
    Unrelated,
    /// Stale, duplicate or unusable frame. Nothing changed.
    Discarded,
    /// The controller accepted the request, the completion follows asynchronously.
    AwaitCallback,
    /// The current step finished successfully.
    Completed,
    /// The controller refused to place the frame on its stack.
    Rejected(u8),
    /// The node did not get the frame. Goes through the retry policy.
    TransmissionFailed(TransmissionState),
    /// Terminal failure without retry.
    Failed(ZWaveError),
}

pub(crate) type ResponseHandler = fn(&mut NetworkState, &Transaction, &SerialMessage) -> HandlerOutcome;
pub(crate) type RequestHandler =
    fn(&mut NetworkState, Option<&Transaction>, &SerialMessage) -> HandlerOutcome;

/// A `handle_response`/`handle_request` pair for one message class.
pub(crate) struct MessageHandler {
    pub(crate) class: MessageClass,
    pub(crate) handle_response: Option<ResponseHandler>,
    pub(crate) handle_request: Option<RequestHandler>,
}

pub(crate) static HANDLERS: [MessageHandler; 9] = [
    MessageHandler {
        class: MessageClass::SendData,
        handle_response: Some(send_data_response),
        handle_request: Some(send_data_request),
    },
    MessageHandler {
        class: MessageClass::ApplicationCommandHandler,
        handle_response: None,
        handle_request: Some(application_command_request),
    },
    MessageHandler {
        class: MessageClass::ApplicationUpdate,
        handle_response: None,
        handle_request: Some(application_update_request),
    },
    MessageHandler {
        class: MessageClass::RequestNodeInfo,
        handle_response: Some(request_node_info_response),
        handle_request: None,
    },
    MessageHandler {
        class: MessageClass::SerialApiGetInitData,
        handle_response: Some(serial_api_get_init_data_response),
        handle_request: None,
    },
    MessageHandler {
        class: MessageClass::IdentifyNode,
        handle_response: Some(identify_node_response),
        handle_request: None,
    },
    MessageHandler {
        class: MessageClass::IsFailedNodeId,
        handle_response: Some(is_failed_node_response),
        handle_request: None,
    },
    MessageHandler {
        class: MessageClass::GetVersion,
        handle_response: Some(get_version_response),
        handle_request: None,
    },
    MessageHandler {
        class: MessageClass::MemoryGetId,
        handle_response: Some(memory_get_id_response),
        handle_request: None,
    },
];

pub(crate) fn lookup(class: MessageClass) -> Option<&'static MessageHandler> {
    HANDLERS.iter().find(|handler| handler.class == class)
}

/// The in-flight transaction, if it is of `class`.
fn in_flight_of(in_flight: Option<&Transaction>, class: MessageClass) -> Option<&Transaction> {
    in_flight.filter(|tx| tx.message.message_class == class)
}

// --- SendData ---

fn send_data_response(
    _state: &mut NetworkState,
    tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    trace!("Handle Message Send Data Response");
    match msg.payload_byte(0) {
        Some(0x00) | None => {
            error!(
                "NODE {:?}: SendData was not placed on stack due to error {:?}",
                tx.node.map(|n| n.0),
                msg.payload_byte(0)
            );
            HandlerOutcome::Rejected(msg.payload_byte(0).unwrap_or(0))
        }
        Some(_) => {
            debug!("Sent Data successfully placed on stack.");
            HandlerOutcome::AwaitCallback
        }
    }
}

fn send_data_request(
    state: &mut NetworkState,
    in_flight: Option<&Transaction>,
    msg: &SerialMessage,
) -> HandlerOutcome {
    trace!("Handle Message Send Data Request");
    let callback_id = msg.payload_byte(0);
    let Some(status) = msg.payload_byte(1).and_then(TransmissionState::from_byte) else {
        warn!("Transmission state not found, ignoring.");
        return HandlerOutcome::Discarded;
    };
    let Some(tx) = in_flight_of(in_flight, MessageClass::SendData) else {
        warn!("SendData callback {callback_id:?} with no SendData outstanding, ignoring.");
        return HandlerOutcome::Discarded;
    };
    let Some(node_id) = tx.node else {
        return HandlerOutcome::Discarded;
    };
    let Some(node) = state.node_mut(node_id) else {
        warn!("NODE {}: not found, SendData callback ignored.", node_id);
        return HandlerOutcome::Discarded;
    };

    debug!(
        "NODE {}: SendData Request. CallBack ID = {:?}, Status = {} ({:#04x})",
        node_id, callback_id, status, status as u8
    );

    let awaiting = matches!(
        tx.phase,
        TransactionPhase::AwaitingAck
            | TransactionPhase::AwaitingResponse
            | TransactionPhase::AwaitingCallback
    );
    if !awaiting || tx.callback_id != callback_id {
        warn!(
            "NODE {}: Already processed another send data request for this callback Id, ignoring.",
            node_id
        );
        return HandlerOutcome::Discarded;
    }

    if !status.is_ok() {
        return HandlerOutcome::TransmissionFailed(status);
    }

    // The controller got an ACK from the device, so count it as received.
    node.increment_receive_count();
    if node.is_dead() {
        if let Some(restored) = node.set_alive() {
            debug!("NODE {}: Node has risen from the DEAD. Set stage to {:?}.", node_id, restored);
            state.push_stage_change(node_id, NodeStage::Dead, restored);
        }
    } else {
        node.reset_resend_count();
    }
    HandlerOutcome::Completed
}

// --- ApplicationCommandHandler ---

fn application_command_request(
    state: &mut NetworkState,
    in_flight: Option<&Transaction>,
    msg: &SerialMessage,
) -> HandlerOutcome {
    let node_id = match msg.payload_node(1) {
        Ok(id) => id,
        Err(e) => {
            warn!("Application command with bad source node: {}", e);
            return HandlerOutcome::Discarded;
        }
    };
    let length = msg.payload_byte(2).unwrap_or(0) as usize;
    let Some(command) = msg.payload.get(3..3 + length).filter(|c| !c.is_empty()) else {
        warn!("NODE {}: truncated application command, ignoring.", node_id);
        return HandlerOutcome::Discarded;
    };
    let class = CommandClassId(command[0]);
    let command_id = command.get(1).copied().unwrap_or(0);
    let values = command.get(2..).unwrap_or(&[]);

    let Some(node) = state.node_mut(node_id) else {
        warn!("NODE {}: application command for unknown node, ignoring.", node_id);
        return HandlerOutcome::Discarded;
    };
    node.increment_receive_count();
    debug!("NODE {}: Application command {} {:#04x}", node_id, class, command_id);

    match (class, command_id) {
        (CommandClassId::WAKE_UP, WAKE_UP_NOTIFICATION) => {
            info!("NODE {}: received wake-up notification", node_id);
            node.set_asleep(false);
            state.woken.push(node_id);
        }
        (CommandClassId::MANUFACTURER_SPECIFIC, MANUFACTURER_SPECIFIC_REPORT) if values.len() >= 6 => {
            let info = ManufacturerInfo {
                manufacturer_id: u16::from_be_bytes([values[0], values[1]]),
                product_type: u16::from_be_bytes([values[2], values[3]]),
                product_id: u16::from_be_bytes([values[4], values[5]]),
            };
            info!(
                "NODE {}: manufacturer {:#06x} type {:#06x} id {:#06x}",
                node_id, info.manufacturer_id, info.product_type, info.product_id
            );
            node.set_manufacturer(info);
        }
        (CommandClassId::VERSION, VERSION_COMMAND_CLASS_REPORT) if values.len() >= 2 => {
            let reported = CommandClassId(values[0]);
            if let Err(e) = node.set_command_class_version(reported, values[1]) {
                debug!("NODE {}: version of {} not recorded: {}", node_id, reported, e);
            }
        }
        _ => state.events.push(ControllerEvent::ValueUpdate {
            node: node_id,
            command_class: class,
            command: command_id,
            value: values.to_vec(),
        }),
    }

    match in_flight {
        Some(tx)
            if tx.phase == TransactionPhase::AwaitingReport
                && tx.node == Some(node_id)
                && tx.expected_report == Some(class) =>
        {
            HandlerOutcome::Completed
        }
        _ => HandlerOutcome::Unrelated,
    }
}

// --- ApplicationUpdate / RequestNodeInfo ---

fn application_update_request(
    state: &mut NetworkState,
    in_flight: Option<&Transaction>,
    msg: &SerialMessage,
) -> HandlerOutcome {
    let pending = in_flight_of(in_flight, MessageClass::RequestNodeInfo).filter(|tx| {
        matches!(
            tx.phase,
            TransactionPhase::AwaitingResponse | TransactionPhase::AwaitingCallback
        )
    });

    match msg.payload_byte(0) {
        Some(UPDATE_STATE_NODE_INFO_RECEIVED) => {
            let node_id = match msg.payload_node(1) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Node information with bad node id: {}", e);
                    return HandlerOutcome::Discarded;
                }
            };
            let length = msg.payload_byte(2).unwrap_or(0) as usize;
            let info = msg.payload.get(3..).unwrap_or(&[]);
            let info = &info[..length.min(info.len())];
            if info.len() < 3 {
                warn!("NODE {}: truncated node information, ignoring.", node_id);
                return HandlerOutcome::Discarded;
            }

            state.discover(node_id);
            if let Some(node) = state.node_mut(node_id) {
                node.set_device_class(DeviceClass {
                    basic: info[0],
                    generic: info[1],
                    specific: info[2],
                });
                for &raw in info[3..].iter().take_while(|&&b| b != CommandClassId::MARK.0) {
                    match node.add_command_class(CommandClassId(raw)) {
                        Ok(true) => debug!("NODE {}: supports {}", node_id, CommandClassId(raw)),
                        Ok(false) => {}
                        Err(e) => {
                            debug!("NODE {}: node information not applied: {}", node_id, e);
                            break;
                        }
                    }
                }
            }

            match pending {
                Some(tx) if tx.node == Some(node_id) => HandlerOutcome::Completed,
                _ => HandlerOutcome::Unrelated,
            }
        }
        Some(UPDATE_STATE_NODE_INFO_REQ_FAILED) => match pending {
            Some(tx) => {
                warn!("NODE {:?}: request node info failed", tx.node.map(|n| n.0));
                HandlerOutcome::TransmissionFailed(TransmissionState::CompleteFail)
            }
            None => HandlerOutcome::Discarded,
        },
        other => {
            debug!("Unhandled application update state {:?}", other);
            HandlerOutcome::Unrelated
        }
    }
}

fn request_node_info_response(
    _state: &mut NetworkState,
    tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    match msg.payload_byte(0) {
        Some(0x00) | None => {
            error!("NODE {:?}: Request node info not placed on stack", tx.node.map(|n| n.0));
            HandlerOutcome::Rejected(0)
        }
        Some(_) => HandlerOutcome::AwaitCallback,
    }
}

// --- Controller and protocol information ---

fn serial_api_get_init_data_response(
    state: &mut NetworkState,
    _tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    state.info.serial_api_version = msg.payload_byte(0);
    let length = msg.payload_byte(2).unwrap_or(0) as usize;
    let Some(bitmask) = msg.payload.get(3..3 + length) else {
        warn!("Init data with truncated node bitmask");
        return HandlerOutcome::Failed(ZWaveError::MalformedFrame);
    };
    if length != NODE_BITMASK_SIZE {
        warn!("Unexpected node bitmask size {}", length);
    }

    let mut found = 0;
    // Bits past the standard mask address no valid node id.
    for (index, byte) in bitmask.iter().take(NODE_BITMASK_SIZE).enumerate() {
        for bit in 0..8 {
            if byte & (1 << bit) == 0 {
                continue;
            }
            let Ok(raw) = u8::try_from(index * 8 + bit + 1) else {
                continue;
            };
            if let Ok(node_id) = NodeId::try_from(raw) {
                state.discover(node_id);
                found += 1;
            }
        }
    }
    info!("Controller reports {} node(s)", found);
    HandlerOutcome::Completed
}

fn identify_node_response(
    state: &mut NetworkState,
    tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    let Some(node_id) = tx.node else {
        return HandlerOutcome::Discarded;
    };
    if msg.payload.len() < 6 {
        warn!("NODE {}: protocol information too short", node_id);
        return HandlerOutcome::Failed(ZWaveError::MalformedFrame);
    }
    let Some(node) = state.node_mut(node_id) else {
        warn!("NODE {}: not found, protocol information ignored.", node_id);
        return HandlerOutcome::Discarded;
    };

    let listening = msg.payload[0] & 0x80 != 0;
    let frequently_listening = msg.payload[1] & 0x60 != 0;
    node.set_listening_flags(listening, frequently_listening);
    node.set_device_class(DeviceClass {
        basic: msg.payload[3],
        generic: msg.payload[4],
        specific: msg.payload[5],
    });
    debug!(
        "NODE {}: listening = {}, frequently listening = {}",
        node_id, listening, frequently_listening
    );
    HandlerOutcome::Completed
}

fn is_failed_node_response(
    state: &mut NetworkState,
    tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    let Some(node_id) = tx.node else {
        return HandlerOutcome::Discarded;
    };
    let Some(node) = state.node_mut(node_id) else {
        warn!("NODE {}: not found, failed-node check ignored.", node_id);
        return HandlerOutcome::Discarded;
    };
    if msg.payload_byte(0).unwrap_or(0) != 0x00 {
        let from = node.stage();
        if node.set_failed() {
            state.push_stage_change(node_id, from, NodeStage::Failed);
        }
    } else {
        debug!("NODE {}: is not on the failed list", node_id);
    }
    HandlerOutcome::Completed
}

fn get_version_response(
    state: &mut NetworkState,
    _tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    let end = msg
        .payload
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(msg.payload.len());
    let version = String::from_utf8_lossy(&msg.payload[..end]).into_owned();
    info!("Controller library version {}", version);
    state.info.library_version = Some(version);
    state.info.library_type = msg.payload_byte(end + 1);
    HandlerOutcome::Completed
}

fn memory_get_id_response(
    state: &mut NetworkState,
    _tx: &Transaction,
    msg: &SerialMessage,
) -> HandlerOutcome {
    if msg.payload.len() < 5 {
        return HandlerOutcome::Failed(ZWaveError::MalformedFrame);
    }
    let home_id = u32::from_be_bytes([msg.payload[0], msg.payload[1], msg.payload[2], msg.payload[3]]);
    info!("Home id {:#010x}, controller node {}", home_id, msg.payload[4]);
    state.info.home_id = Some(home_id);
    state.info.own_node_id = NodeId::try_from(msg.payload[4]).ok();
    HandlerOutcome::Completed
}
