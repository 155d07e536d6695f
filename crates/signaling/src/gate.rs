//! Join-Gate
//!
//! Solange die lokale Anwendung keinen Raumbeitritt (`join-room`)
//! angekuendigt hat, darf der Dispatcher keine Session-Nachrichten
//! verarbeiten. Sonst wuerden Verbindungsversuche starten, bevor lokale
//! Medien und Zustand bereit sind (ungueltige ICE-Kandidaten).
//!
//! Presence und die Event-Registry sind vom Gate unabhaengig.

/// Boolesches Gate pro Sitzung
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinGate {
    offen: bool,
}

impl JoinGate {
    /// Neues, geschlossenes Gate
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn oeffnen(&mut self) {
        if !self.offen {
            tracing::debug!("Join-Gate geoeffnet");
        }
        self.offen = true;
    }

    pub fn schliessen(&mut self) {
        if self.offen {
            tracing::debug!("Join-Gate geschlossen");
        }
        self.offen = false;
    }

    pub fn ist_offen(&self) -> bool {
        self.offen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startet_geschlossen() {
        assert!(!JoinGate::neu().ist_offen());
    }

    #[test]
    fn oeffnen_und_schliessen_sind_idempotent() {
        let mut gate = JoinGate::neu();
        gate.oeffnen();
        gate.oeffnen();
        assert!(gate.ist_offen());
        gate.schliessen();
        gate.schliessen();
        assert!(!gate.ist_offen());
    }
}
