//! Secure datagram transport (C1, §4.1): a DTLS 1.2 client session authenticated by
//! EC-JPAKE against the TBR's admin code, with no certificate chain involved at all.
//!
//! This wraps the mbedTLS C API directly through `mbedtls-sys-auto` rather than through
//! the higher-level `mbedtls` safe wrapper, because EC-JPAKE-only DTLS with a single pinned
//! ciphersuite and no PKI falls outside what that wrapper's `Config` builder exposes. The
//! shape mirrors the C library itself: an `ssl_config` shared by setup, an `ssl_context` for
//! the live session, and an entropy/DRBG pair feeding the handshake's randomness.

use std::ffi::c_void;
use std::net::UdpSocket;
use std::os::raw::{c_char, c_int};
use std::time::Duration;

use mbedtls_sys::*;

use crate::config::DtlsLogLevel;
use crate::error::TransportError;
use crate::logging::forward_dtls_log;
use crate::admin_code::AdminCode;

/// IANA ciphersuite id for `TLS_ECJPAKE_WITH_AES_128_CCM_8`, the only suite a Thread
/// commercial commissioner ever negotiates.
const ECJPAKE_CIPHERSUITE: c_int = 0xC0FF;

/// A live (or torn-down) secure datagram session.
///
/// Every mbedTLS context here is heap-pinned for the lifetime of the struct so the C
/// library's internal self-pointers stay valid; `Drop` is the single path that frees them,
/// and it is safe to call on a session that failed partway through `connect`.
pub struct SecureTransport {
    /// Heap-pinned: `ssl_set_bio` hands mbedTLS a raw pointer to this socket, which must
    /// stay at a fixed address even as `SecureTransport` itself is moved around by its owner.
    socket: Box<UdpSocket>,
    entropy: Box<entropy_context>,
    ctr_drbg: Box<ctr_drbg_context>,
    config: Box<ssl_config>,
    context: Box<ssl_context>,
    log_level: DtlsLogLevel,
    established: bool,
}

// The mbedTLS contexts are only ever touched from the task that owns this struct, and all
// blocking FFI calls are wrapped in `spawn_blocking`, but the raw pointers they embed are
// not `Sync`. Moving the whole session between tasks is fine; sharing it is not.
unsafe impl Send for SecureTransport {}

impl SecureTransport {
    /// Performs the full DTLS handshake against `host:port` using `admin_code` as the
    /// EC-JPAKE shared secret. Blocks the calling thread; callers on an async runtime should
    /// run this inside `tokio::task::spawn_blocking`.
    pub fn connect(
        host: &str,
        port: u16,
        admin_code: &AdminCode,
        read_timeout: Duration,
        handshake_step_cap: u32,
        log_level: DtlsLogLevel,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        socket
            .connect((host, port))
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        socket
            .set_read_timeout(Some(read_timeout))
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        // Boxed immediately so the address handed to `ssl_set_bio` below stays valid even
        // though `socket` itself is about to be moved into the returned `SecureTransport`.
        let socket = Box::new(socket);

        let mut entropy = Box::new(unsafe { std::mem::zeroed::<entropy_context>() });
        let mut ctr_drbg = Box::new(unsafe { std::mem::zeroed::<ctr_drbg_context>() });
        let mut config = Box::new(unsafe { std::mem::zeroed::<ssl_config>() });
        let mut context = Box::new(unsafe { std::mem::zeroed::<ssl_context>() });

        unsafe {
            entropy_init(entropy.as_mut());
            ctr_drbg_init(ctr_drbg.as_mut());
            ssl_config_init(config.as_mut());
            ssl_init(context.as_mut());

            let seed_label = b"thread-commissioner\0";
            let ret = ctr_drbg_seed(
                ctr_drbg.as_mut(),
                Some(entropy_func),
                entropy.as_mut() as *mut entropy_context as *mut c_void,
                seed_label.as_ptr(),
                seed_label.len() - 1,
            );
            if ret != 0 {
                free_all(&mut entropy, &mut ctr_drbg, &mut config, &mut context);
                return Err(TransportError::ConnectionFailed(format!("DRBG seed failed ({ret:#x})")));
            }

            let ret = ssl_config_defaults(
                config.as_mut(),
                SSL_IS_CLIENT as c_int,
                SSL_TRANSPORT_DATAGRAM as c_int,
                SSL_PRESET_DEFAULT as c_int,
            );
            if ret != 0 {
                free_all(&mut entropy, &mut ctr_drbg, &mut config, &mut context);
                return Err(TransportError::ConnectionFailed(format!("config defaults failed ({ret:#x})")));
            }

            ssl_conf_rng(config.as_mut(), Some(ctr_drbg_random), ctr_drbg.as_mut() as *mut ctr_drbg_context as *mut c_void);
            ssl_conf_authmode(config.as_mut(), SSL_VERIFY_NONE as c_int);

            let ciphersuites: &'static [c_int] = &[ECJPAKE_CIPHERSUITE, 0];
            ssl_conf_ciphersuites(config.as_mut(), ciphersuites.as_ptr());

            ssl_conf_dbg(config.as_mut(), Some(debug_trampoline), std::ptr::null_mut());
            ssl_conf_read_timeout(config.as_mut(), read_timeout.as_millis() as u32);

            let ret = ssl_setup(context.as_mut(), config.as_mut());
            if ret != 0 {
                free_all(&mut entropy, &mut ctr_drbg, &mut config, &mut context);
                return Err(TransportError::ConnectionFailed(format!("ssl_setup failed ({ret:#x})")));
            }

            let password = admin_code.as_ascii_bytes();
            let ret = ssl_set_hs_ecjpake_password(context.as_mut(), password.as_ptr(), password.len());
            if ret != 0 {
                free_all(&mut entropy, &mut ctr_drbg, &mut config, &mut context);
                return Err(TransportError::ConnectionFailed(format!("ecjpake password rejected ({ret:#x})")));
            }

            ssl_set_bio(
                context.as_mut(),
                socket.as_ref() as *const UdpSocket as *mut c_void,
                Some(bio_send),
                Some(bio_recv),
                None,
            );
        }

        let mut session = SecureTransport {
            socket,
            entropy,
            ctr_drbg,
            config,
            context,
            log_level,
            established: false,
        };
        session.run_handshake(handshake_step_cap)?;
        Ok(session)
    }

    /// Drives the handshake one step at a time, the way a non-blocking mbedTLS client must:
    /// each call to `mbedtls_ssl_handshake_step` may return `WANT_READ`/`WANT_WRITE` and has
    /// to be retried, bounded here at `cap` iterations so a silent peer cannot hang forever.
    fn run_handshake(&mut self, cap: u32) -> Result<(), TransportError> {
        for _ in 0..cap {
            let ret = unsafe { ssl_handshake_step(self.context.as_mut()) };
            match ret {
                0 => {
                    if unsafe { self.context.state } >= SSL_HANDSHAKE_OVER as c_int {
                        self.established = true;
                        return Ok(());
                    }
                }
                ERR_SSL_WANT_READ | ERR_SSL_WANT_WRITE => continue,
                other => {
                    return Err(TransportError::HandshakeFailed {
                        code: other,
                        message: mbedtls_strerror(other),
                    });
                }
            }
        }
        Err(TransportError::HandshakeFailed {
            code: 0,
            message: format!("handshake did not complete within {cap} steps"),
        })
    }

    /// Encrypts and sends `payload` over the established session.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let ret = unsafe { ssl_write(self.context.as_mut(), payload.as_ptr(), payload.len()) };
        if ret < 0 {
            return Err(TransportError::SendFailed(ret as i32));
        }
        Ok(())
    }

    /// Reads and decrypts one datagram, up to `max_len` bytes (4096 by default).
    pub fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_len];
        let ret = unsafe { ssl_read(self.context.as_mut(), buf.as_mut_ptr(), buf.len()) };
        if ret < 0 {
            return Err(TransportError::ReceiveFailed(ret as i32));
        }
        buf.truncate(ret as usize);
        Ok(buf)
    }

    /// Adjusts mbedTLS's debug verbosity threshold for the remainder of this session.
    pub fn set_log_level(&mut self, level: DtlsLogLevel) {
        self.log_level = level;
        unsafe { debug_set_threshold(level.as_mbedtls_threshold()) };
    }

    /// Marks the session torn down without sending `close_notify`. Observed to be unsafe
    /// after certain error paths in the reference implementation, so the peer is left to
    /// time out the session instead. Safe to call more than once, and safe even if the
    /// handshake never finished.
    pub fn close(&mut self) {
        self.established = false;
    }
}

impl Drop for SecureTransport {
    fn drop(&mut self) {
        self.close();
        unsafe {
            ssl_free(self.context.as_mut());
            ssl_config_free(self.config.as_mut());
            ctr_drbg_free(self.ctr_drbg.as_mut());
            entropy_free(self.entropy.as_mut());
        }
    }
}

unsafe fn free_all(
    entropy: &mut entropy_context,
    ctr_drbg: &mut ctr_drbg_context,
    config: &mut ssl_config,
    context: &mut ssl_context,
) {
    ssl_free(context);
    ssl_config_free(config);
    ctr_drbg_free(ctr_drbg);
    entropy_free(entropy);
}

/// mbedTLS debug callback: forwards every line to `tracing` through [`forward_dtls_log`].
/// The configured threshold is read from the global default because mbedTLS's C signature
/// gives us no way to recover a typed context pointer safely across the FFI boundary here;
/// `set_log_level` adjusts the library-wide threshold instead so filtering still happens.
extern "C" fn debug_trampoline(
    _ctx: *mut c_void,
    level: c_int,
    file: *const c_char,
    line: c_int,
    message: *const c_char,
) {
    let file = unsafe { std::ffi::CStr::from_ptr(file) }.to_string_lossy();
    let message = unsafe { std::ffi::CStr::from_ptr(message) }.to_string_lossy();
    forward_dtls_log(DtlsLogLevel::Verbose, level, &file, line, &message);
}

extern "C" fn bio_send(ctx: *mut c_void, buf: *const u8, len: usize) -> c_int {
    let socket = unsafe { &*(ctx as *const UdpSocket) };
    let slice = unsafe { std::slice::from_raw_parts(buf, len) };
    match socket.send(slice) {
        Ok(sent) => sent as c_int,
        Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => ERR_SSL_WANT_WRITE,
        Err(_) => ERR_NET_SEND_FAILED,
    }
}

extern "C" fn bio_recv(ctx: *mut c_void, buf: *mut u8, len: usize) -> c_int {
    let socket = unsafe { &*(ctx as *const UdpSocket) };
    let slice = unsafe { std::slice::from_raw_parts_mut(buf, len) };
    match socket.recv(slice) {
        Ok(received) => received as c_int,
        Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
            ERR_SSL_WANT_READ
        }
        Err(_) => ERR_NET_RECV_FAILED,
    }
}

fn mbedtls_strerror(code: c_int) -> String {
    let mut buf = [0u8; 128];
    unsafe {
        strerror(code, buf.as_mut_ptr() as *mut c_char, buf.len());
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
