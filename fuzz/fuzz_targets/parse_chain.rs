#![no_main]

use certchain_lib::{parse_cert, parse_pem_chain, ChainReport, ReportOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing, classification and reporting must never panic.
    if let Ok(cert) = parse_cert(data) {
        let _ = certchain_lib::is_self_signed(&cert);
        let _ = certchain_lib::max_lifespan_days(&cert);
        let _ = certchain_lib::format_serial_number(&cert.serial);
    }

    if let Ok(chain) = parse_pem_chain(data) {
        let _ = certchain_lib::positions(&chain);
        if let Ok(report) = ChainReport::build(&chain, &ReportOptions::default()) {
            let _ = certchain_lib::display_text(&report);
            let _ = certchain_lib::to_json(&report);
        }
    }
});
