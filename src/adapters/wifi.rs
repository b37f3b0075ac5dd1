//! Wi-Fi soft-AP adapter.
//!
//! The monitor is its own network: phones join the access point and talk
//! to the HTTP query surface directly.  No station mode, no upstream.
//!
//! ## cfg gating
//!
//! - **`espidf`**: real ESP-IDF Wi-Fi driver calls via `esp_idf_svc::wifi`.
//! - **host**: simulation stub so credential handling stays testable.

use core::fmt;
use log::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApError {
    InvalidSsid,
    InvalidPassword,
    StartFailed,
}

impl fmt::Display for ApError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::StartFailed => write!(f, "access point failed to start"),
        }
    }
}

impl core::error::Error for ApError {}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ApError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ApError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ApError::InvalidPassword);
    }
    Ok(())
}

/// Validated soft-AP credentials.
#[derive(Debug, Clone)]
pub struct ApCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl ApCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ApError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds.ssid.push_str(ssid).map_err(|()| ApError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|()| ApError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Owns the running access point.  Dropping it tears the AP down.
pub struct AccessPoint {
    creds: ApCredentials,
    up: bool,
    #[cfg(feature = "espidf")]
    wifi: Option<
        esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    >,
}

impl AccessPoint {
    pub fn new(creds: ApCredentials) -> Self {
        Self {
            creds,
            up: false,
            #[cfg(feature = "espidf")]
            wifi: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Bring the AP up with power save disabled.
    #[cfg(feature = "espidf")]
    pub fn start(
        &mut self,
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
    ) -> Result<(), ApError> {
        use esp_idf_svc::wifi::{
            AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi,
        };
        use log::error;

        let fail = |e: esp_idf_svc::sys::EspError| {
            error!("WiFi: AP start failed ({})", e);
            ApError::StartFailed
        };

        let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(fail)?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(fail)?;
        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid: self
                .creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ApError::InvalidSsid)?,
            password: self
                .creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| ApError::InvalidPassword)?,
            auth_method: if self.creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            channel: 1,
            ..Default::default()
        }))
        .map_err(fail)?;
        wifi.start().map_err(fail)?;
        wifi.wait_netif_up().map_err(fail)?;

        // Keep the radio awake so HTTP latency stays low.
        unsafe {
            esp_idf_svc::sys::esp_wifi_set_ps(esp_idf_svc::sys::wifi_ps_type_t_WIFI_PS_NONE);
        }

        match wifi.wifi().ap_netif().get_ip_info() {
            Ok(ip) => info!("WiFi: AP '{}' started, IP {}", self.creds.ssid, ip.ip),
            Err(_) => info!("WiFi: AP '{}' started", self.creds.ssid),
        }
        self.wifi = Some(wifi);
        self.up = true;
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    pub fn start(&mut self) -> Result<(), ApError> {
        info!("WiFi(sim): AP '{}' started", self.creds.ssid);
        self.up = true;
        Ok(())
    }
}
