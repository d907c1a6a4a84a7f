//! CEC adapters through the Linux kernel CEC framework (/dev/cecN). The
//! adapters are listed in sysfs under /sys/class/cec.

use super::{
    AdapterConfig, AdapterDescriptor, CecAdapter, CecBus, ErrorCallback, KeyTracker,
    KeypressCallback, LogicalAddress, PowerStatus, UserControlCode,
};
use nix::{errno::Errno, ioctl_read, ioctl_readwrite, ioctl_write_ptr};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind},
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const CEC_MAGIC: u8 = b'a';

const CEC_ADAP_G_CAPS: u8 = 0;
const CEC_ADAP_G_PHYS_ADDR: u8 = 1;
const CEC_ADAP_G_LOG_ADDRS: u8 = 3;
const CEC_ADAP_S_LOG_ADDRS: u8 = 4;
const CEC_TRANSMIT: u8 = 5;
const CEC_RECEIVE: u8 = 6;
const CEC_S_MODE: u8 = 9;

ioctl_readwrite!(cec_adap_g_caps, CEC_MAGIC, CEC_ADAP_G_CAPS, CecCaps);
ioctl_read!(cec_adap_g_phys_addr, CEC_MAGIC, CEC_ADAP_G_PHYS_ADDR, u16);
ioctl_read!(
    cec_adap_g_log_addrs,
    CEC_MAGIC,
    CEC_ADAP_G_LOG_ADDRS,
    CecLogAddrs
);
ioctl_readwrite!(
    cec_adap_s_log_addrs,
    CEC_MAGIC,
    CEC_ADAP_S_LOG_ADDRS,
    CecLogAddrs
);
ioctl_readwrite!(cec_transmit, CEC_MAGIC, CEC_TRANSMIT, CecMsg);
ioctl_readwrite!(cec_receive, CEC_MAGIC, CEC_RECEIVE, CecMsg);
ioctl_write_ptr!(cec_s_mode, CEC_MAGIC, CEC_S_MODE, u32);

const CEC_CAP_LOG_ADDRS: u32 = 1 << 1;

const CEC_MODE_INITIATOR: u32 = 1;
const CEC_MODE_FOLLOWER: u32 = 1 << 4;

const CEC_LOG_ADDR_INVALID: u8 = 0xff;
const CEC_LOG_ADDR_TYPE_PLAYBACK: u8 = 3;
const CEC_OP_PRIM_DEVTYPE_PLAYBACK: u8 = 4;
const CEC_OP_ALL_DEVTYPE_PLAYBACK: u8 = 0x10;
const CEC_OP_CEC_VERSION_1_4: u8 = 5;
const CEC_VENDOR_ID_NONE: u32 = 0xffff_ffff;

const CEC_TX_STATUS_OK: u8 = 1;
const CEC_RX_STATUS_OK: u8 = 1;

const CEC_MSG_IMAGE_VIEW_ON: u8 = 0x04;
const CEC_MSG_USER_CONTROL_PRESSED: u8 = 0x44;
const CEC_MSG_USER_CONTROL_RELEASED: u8 = 0x45;
const CEC_MSG_ACTIVE_SOURCE: u8 = 0x82;
const CEC_MSG_GIVE_DEVICE_POWER_STATUS: u8 = 0x8f;
const CEC_MSG_REPORT_POWER_STATUS: u8 = 0x90;

/// Longest the receive thread blocks before checking whether it should stop
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const REPLY_TIMEOUT_MS: u32 = 1000;

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
pub(crate) struct CecCaps {
    driver: [u8; 32],
    name: [u8; 32],
    available_log_addrs: u32,
    capabilities: u32,
    version: u32,
}

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
pub(crate) struct CecLogAddrs {
    log_addr: [u8; 4],
    log_addr_mask: u16,
    cec_version: u8,
    num_log_addrs: u8,
    vendor_id: u32,
    flags: u32,
    osd_name: [u8; 15],
    primary_device_type: [u8; 4],
    log_addr_type: [u8; 4],
    all_device_types: [u8; 4],
    features: [[u8; 12]; 4],
}

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
pub(crate) struct CecMsg {
    tx_ts: u64,
    rx_ts: u64,
    len: u32,
    timeout: u32,
    sequence: u32,
    flags: u32,
    msg: [u8; 16],
    reply: u8,
    rx_status: u8,
    tx_status: u8,
    tx_arb_lost_cnt: u8,
    tx_nack_cnt: u8,
    tx_low_drive_cnt: u8,
    tx_error_cnt: u8,
}

impl CecMsg {
    fn new(initiator: LogicalAddress, destination: LogicalAddress, payload: &[u8]) -> Self {
        let mut msg = CecMsg {
            len: 1 + payload.len() as u32,
            ..Default::default()
        };

        msg.msg[0] = (initiator.0 << 4) | (destination.0 & 0xf);
        msg.msg[1..=payload.len()].copy_from_slice(payload);

        msg
    }
}

/// CEC adapters provided by the Linux kernel
#[derive(Default)]
pub struct KernelCec;

impl CecBus for KernelCec {
    type Adapter = KernelAdapter;

    fn discover(&self) -> io::Result<Vec<AdapterDescriptor>> {
        let entries = match fs::read_dir("/sys/class/cec") {
            Ok(res) => res,
            Err(e) => {
                return if e.kind() == ErrorKind::NotFound {
                    // Kernel compiled without CONFIG_CEC_CORE or no cec driver loaded
                    Ok(Vec::new())
                } else {
                    Err(e)
                };
            }
        };

        let mut adapters = Vec::new();

        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };

            let dev_name = read_dev_name(&entry.path())?.unwrap_or_else(|| name.clone());
            let path = PathBuf::from(format!("/dev/{dev_name}"));

            let driver = match open_device(&path).and_then(|file| get_caps(&file)) {
                Ok(caps) => c_string(&caps.driver),
                Err(e) => {
                    log::debug!("{}: {e}", path.display());
                    String::new()
                }
            };

            adapters.push(AdapterDescriptor { name, path, driver });
        }

        adapters.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(adapters)
    }

    fn open(
        &self,
        descriptor: &AdapterDescriptor,
        config: &AdapterConfig,
        callback: KeypressCallback,
        on_error: ErrorCallback,
    ) -> io::Result<KernelAdapter> {
        let file = open_device(&descriptor.path)?;
        let caps = get_caps(&file)?;

        let mode = CEC_MODE_INITIATOR | CEC_MODE_FOLLOWER;
        unsafe { cec_s_mode(file.as_raw_fd(), &mode) }?;

        let log_addr = claim_logical_address(&file, &caps, config)?;

        let mut phys_addr = 0u16;
        unsafe { cec_adap_g_phys_addr(file.as_raw_fd(), &mut phys_addr) }?;

        log::info!(
            "{}: logical address {} physical address {:x}.{:x}.{:x}.{:x}",
            descriptor.path.display(),
            log_addr.0,
            phys_addr >> 12,
            (phys_addr >> 8) & 0xf,
            (phys_addr >> 4) & 0xf,
            phys_addr & 0xf
        );

        let stop = Arc::new(AtomicBool::new(false));
        let receiver = file.try_clone()?;
        let tracker = KeyTracker::new(config);

        let thread = thread::Builder::new()
            .name(format!("{}-receive", descriptor.name))
            .spawn({
                let stop = Arc::clone(&stop);
                let path = descriptor.path.clone();

                move || {
                    if let Err(err) = receive_loop(&path, receiver, tracker, callback, &stop) {
                        log::error!("{}: receive failed: {err}", path.display());
                        on_error(err.into());
                    }
                }
            })?;

        Ok(KernelAdapter {
            path: descriptor.path.clone(),
            file,
            log_addr,
            phys_addr,
            stop,
            thread: Some(thread),
        })
    }
}

/// An open /dev/cecN with its receive thread
pub struct KernelAdapter {
    path: PathBuf,
    file: File,
    log_addr: LogicalAddress,
    phys_addr: u16,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl KernelAdapter {
    fn transmit(&self, msg: &mut CecMsg) -> io::Result<()> {
        unsafe { cec_transmit(self.file.as_raw_fd(), msg) }?;

        if msg.tx_status & CEC_TX_STATUS_OK == 0 {
            log::warn!(
                "{}: opcode 0x{:02x} to {} not acknowledged",
                self.path.display(),
                msg.msg[1],
                msg.msg[0] & 0xf
            );
        }

        Ok(())
    }
}

impl CecAdapter for KernelAdapter {
    fn power_status(&mut self, address: LogicalAddress) -> io::Result<PowerStatus> {
        let mut msg = CecMsg::new(self.log_addr, address, &[CEC_MSG_GIVE_DEVICE_POWER_STATUS]);
        msg.reply = CEC_MSG_REPORT_POWER_STATUS;
        msg.timeout = REPLY_TIMEOUT_MS;

        self.transmit(&mut msg)?;

        if msg.rx_status & CEC_RX_STATUS_OK != 0 && msg.len >= 3 {
            Ok(PowerStatus::from(msg.msg[2]))
        } else {
            log::debug!(
                "{}: no power status reply from {}",
                self.path.display(),
                address.0
            );
            Ok(PowerStatus::Unknown)
        }
    }

    fn set_active_source(&mut self) -> io::Result<()> {
        let mut msg = CecMsg::new(self.log_addr, LogicalAddress::TV, &[CEC_MSG_IMAGE_VIEW_ON]);

        self.transmit(&mut msg)?;

        let [high, low] = self.phys_addr.to_be_bytes();
        let mut msg = CecMsg::new(
            self.log_addr,
            LogicalAddress::BROADCAST,
            &[CEC_MSG_ACTIVE_SOURCE, high, low],
        );

        self.transmit(&mut msg)
    }
}

impl Drop for KernelAdapter {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("{}: receive thread panicked", self.path.display());
            }
        }

        log::debug!("{}: closed", self.path.display());
    }
}

fn receive_loop(
    path: &Path,
    file: File,
    mut tracker: KeyTracker,
    mut callback: KeypressCallback,
    stop: &AtomicBool,
) -> Result<(), Errno> {
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        let wait = tracker.next_deadline().map_or(POLL_INTERVAL, |deadline| {
            deadline.saturating_duration_since(now).min(POLL_INTERVAL)
        });

        let mut msg = CecMsg {
            timeout: wait.as_millis().max(1) as u32,
            ..Default::default()
        };

        match unsafe { cec_receive(file.as_raw_fd(), &mut msg) } {
            Ok(_) => handle_message(&msg, &mut tracker, &mut callback),
            Err(Errno::ETIMEDOUT) | Err(Errno::EINTR) => (),
            Err(err) => return Err(err),
        }

        tracker.expire(Instant::now(), &mut callback);
    }

    log::debug!("{}: receive stopped", path.display());

    Ok(())
}

fn handle_message(msg: &CecMsg, tracker: &mut KeyTracker, callback: &mut KeypressCallback) {
    if msg.len < 2 {
        return;
    }

    let now = Instant::now();

    match msg.msg[1] {
        CEC_MSG_USER_CONTROL_PRESSED if msg.len >= 3 => {
            let code = UserControlCode(msg.msg[2]);

            log::trace!("user control pressed: {code} from {}", msg.msg[0] >> 4);

            tracker.press(code, now, callback);
        }
        CEC_MSG_USER_CONTROL_RELEASED => {
            log::trace!("user control released from {}", msg.msg[0] >> 4);

            tracker.release(now, callback);
        }
        opcode => {
            log::trace!("ignoring opcode 0x{opcode:02x} from {}", msg.msg[0] >> 4);
        }
    }
}

fn open_device(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

fn get_caps(file: &File) -> io::Result<CecCaps> {
    let mut caps = CecCaps::default();

    match unsafe { cec_adap_g_caps(file.as_raw_fd(), &mut caps) } {
        Ok(_) => Ok(caps),
        Err(Errno::ENOTTY) => Err(io::Error::new(ErrorKind::Other, "not a cec device")),
        Err(e) => Err(e.into()),
    }
}

/// Use the logical address the adapter already has, or claim a playback
/// device address if it has none and we are allowed to configure it
fn claim_logical_address(
    file: &File,
    caps: &CecCaps,
    config: &AdapterConfig,
) -> io::Result<LogicalAddress> {
    let mut log_addrs = CecLogAddrs::default();

    unsafe { cec_adap_g_log_addrs(file.as_raw_fd(), &mut log_addrs) }?;

    if log_addrs.num_log_addrs == 0 && caps.capabilities & CEC_CAP_LOG_ADDRS != 0 {
        let mut claim = CecLogAddrs {
            cec_version: CEC_OP_CEC_VERSION_1_4,
            num_log_addrs: 1,
            vendor_id: CEC_VENDOR_ID_NONE,
            ..Default::default()
        };

        claim.log_addr_type[0] = CEC_LOG_ADDR_TYPE_PLAYBACK;
        claim.primary_device_type[0] = CEC_OP_PRIM_DEVTYPE_PLAYBACK;
        claim.all_device_types[0] = CEC_OP_ALL_DEVTYPE_PLAYBACK;

        // osd_name must be nul terminated
        let name = config.osd_name.as_bytes();
        let len = name.len().min(claim.osd_name.len() - 1);
        claim.osd_name[..len].copy_from_slice(&name[..len]);

        unsafe { cec_adap_s_log_addrs(file.as_raw_fd(), &mut claim) }?;

        log_addrs = claim;
    }

    Ok(match log_addrs.log_addr[0] {
        // not configured yet, e.g. no hotplug; send as unregistered
        CEC_LOG_ADDR_INVALID => LogicalAddress::BROADCAST,
        addr => LogicalAddress(addr),
    })
}

fn read_dev_name(path: &Path) -> io::Result<Option<String>> {
    let uevent = match fs::read_to_string(path.join("uevent")) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    Ok(uevent.lines().find_map(|line| match line.split_once('=') {
        Some(("DEVNAME", value)) => Some(value.to_owned()),
        _ => None,
    }))
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());

    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_layout() {
        assert_eq!(std::mem::size_of::<CecMsg>(), 56);
        assert_eq!(std::mem::size_of::<CecLogAddrs>(), 92);
        assert_eq!(std::mem::size_of::<CecCaps>(), 76);

        let msg = CecMsg::new(
            LogicalAddress(4),
            LogicalAddress::BROADCAST,
            &[CEC_MSG_ACTIVE_SOURCE, 0x10, 0x00],
        );

        assert_eq!(msg.len, 4);
        assert_eq!(msg.msg[..4], [0x4f, 0x82, 0x10, 0x00]);
    }

    #[test]
    fn driver_name() {
        let mut driver = [0u8; 32];
        driver[..7].copy_from_slice(b"vc4_hdm");

        assert_eq!(c_string(&driver), "vc4_hdm");
    }
}
