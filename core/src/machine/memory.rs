//! The machine's flat 32KB address space and the cartridge backup snapshot.

use crate::gfx::palette::IDENTITY_PALETTE;
use crate::gfx::{BYTES_PER_SCREEN, Palette};

/// Total addressable memory.
pub const MEMORY_SIZE: usize = 0x8000;

/// Bytes of memory a cartridge image provides (gfx through sfx).
pub const ROM_SIZE: usize = 0x4300;

/// Fixed memory layout.
pub mod address {
    pub const GFX: usize = 0x0000;
    pub const MAP: usize = 0x2000;
    pub const GFX_FLAGS: usize = 0x3000;
    pub const MUSIC: usize = 0x3100;
    pub const SFX: usize = 0x3200;
    pub const USER_DATA: usize = 0x4300;
    pub const PERSISTENT: usize = 0x5E00;
    pub const DRAW_PALETTE: usize = 0x5F00;
    pub const SCREEN_PALETTE: usize = 0x5F10;
    pub const HW_STATE: usize = 0x5F40;
    pub const SCREEN: usize = 0x6000;
}

/// 64 sound effects of 68 bytes each.
pub const SFX_BANK_SIZE: usize = address::USER_DATA - address::SFX;

pub struct Memory {
    data: Box<[u8; MEMORY_SIZE]>,
    backup: Option<Box<[u8; ROM_SIZE]>>,
}

impl Memory {
    pub fn new() -> Self {
        let mut memory = Self {
            data: Box::new([0; MEMORY_SIZE]),
            backup: None,
        };
        memory.reset_draw_state();
        memory
    }

    /// Clear all memory and restore the default draw state.
    ///
    /// The cartridge backup survives; it belongs to the loaded cartridge,
    /// not to the running program.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.reset_draw_state();
    }

    /// Restore both palettes to the identity mapping.
    pub fn reset_draw_state(&mut self) {
        self.region_mut::<16>(address::DRAW_PALETTE)
            .copy_from_slice(&IDENTITY_PALETTE);
        self.region_mut::<16>(address::SCREEN_PALETTE)
            .copy_from_slice(&IDENTITY_PALETTE);
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.data[addr as usize % MEMORY_SIZE]
    }

    pub fn poke(&mut self, addr: u16, value: u8) {
        self.data[addr as usize % MEMORY_SIZE] = value;
    }

    pub fn as_bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.data
    }

    /// Packed 4bpp screen, row-major, low nibble = left pixel.
    pub fn screen_data(&self) -> &[u8; BYTES_PER_SCREEN] {
        self.region(address::SCREEN)
    }

    pub fn screen_data_mut(&mut self) -> &mut [u8; BYTES_PER_SCREEN] {
        self.region_mut(address::SCREEN)
    }

    /// Palette applied when the screen is displayed.
    pub fn screen_palette(&self) -> Palette<'_> {
        Palette::new(self.region(address::SCREEN_PALETTE))
    }

    pub fn screen_palette_mut(&mut self) -> &mut [u8; 16] {
        self.region_mut(address::SCREEN_PALETTE)
    }

    /// Palette applied by drawing operations.
    pub fn draw_palette(&self) -> Palette<'_> {
        Palette::new(self.region(address::DRAW_PALETTE))
    }

    pub fn rom(&self) -> &[u8; ROM_SIZE] {
        self.region(address::GFX)
    }

    pub fn sfx_bank(&self) -> &[u8; SFX_BANK_SIZE] {
        self.region(address::SFX)
    }

    /// Copy a cartridge image over the ROM area. Shorter images leave the
    /// remainder zeroed; bytes past [`ROM_SIZE`] are ignored.
    pub fn install_rom(&mut self, image: &[u8]) {
        let len = image.len().min(ROM_SIZE);
        let rom = self.region_mut::<ROM_SIZE>(address::GFX);
        rom[..len].copy_from_slice(&image[..len]);
        rom[len..].fill(0);
    }

    /// Snapshot the ROM area so a running program can later be reset to
    /// the cartridge's original contents.
    pub fn backup_cartridge(&mut self) {
        let mut snapshot = Box::new([0; ROM_SIZE]);
        snapshot.copy_from_slice(self.rom());
        self.backup = Some(snapshot);
    }

    /// Copy the snapshot back over the ROM area. Returns false when no
    /// cartridge has been backed up.
    pub fn restore_cartridge(&mut self) -> bool {
        match &self.backup {
            Some(snapshot) => {
                self.data[..ROM_SIZE].copy_from_slice(&snapshot[..]);
                true
            }
            None => false,
        }
    }

    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    fn region<const N: usize>(&self, base: usize) -> &[u8; N] {
        self.data[base..base + N]
            .try_into()
            .expect("memory regions lie inside the address space")
    }

    fn region_mut<const N: usize>(&mut self, base: usize) -> &mut [u8; N] {
        (&mut self.data[base..base + N])
            .try_into()
            .expect("memory regions lie inside the address space")
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_memory_has_identity_palettes() {
        let memory = Memory::new();
        assert_eq!(memory.screen_palette().raw(), &IDENTITY_PALETTE);
        assert_eq!(memory.draw_palette().raw(), &IDENTITY_PALETTE);
        assert!(memory.screen_data().iter().all(|&b| b == 0));
        assert!(!memory.has_backup());
    }

    #[test]
    fn peek_poke_wraps_address_space() {
        let mut memory = Memory::new();
        memory.poke(0x8001, 0xAB);
        assert_eq!(memory.peek(0x0001), 0xAB);
    }

    #[test]
    fn screen_view_starts_at_screen_address() {
        let mut memory = Memory::new();
        memory.poke(address::SCREEN as u16, 0x12);
        memory.poke(0x7FFF, 0x34);
        assert_eq!(memory.screen_data()[0], 0x12);
        assert_eq!(memory.screen_data()[BYTES_PER_SCREEN - 1], 0x34);
    }

    #[test]
    fn install_rom_pads_short_images() {
        let mut memory = Memory::new();
        memory.install_rom(&[0xFF; ROM_SIZE]);
        memory.install_rom(&[1, 2, 3]);
        assert_eq!(&memory.rom()[..4], &[1, 2, 3, 0]);
        assert_eq!(memory.peek((ROM_SIZE - 1) as u16), 0);
    }

    #[test]
    fn restore_cartridge_undoes_program_writes() {
        let mut memory = Memory::new();
        assert!(!memory.restore_cartridge());

        memory.install_rom(&[0x42; 16]);
        memory.backup_cartridge();
        memory.poke(0, 0x00);
        memory.poke(address::SFX as u16, 0x99);

        assert!(memory.restore_cartridge());
        assert_eq!(memory.peek(0), 0x42);
        assert_eq!(memory.peek(address::SFX as u16), 0);
        assert!(memory.has_backup());
    }

    #[test]
    fn clear_keeps_backup() {
        let mut memory = Memory::new();
        memory.install_rom(&[7; 4]);
        memory.backup_cartridge();
        memory.clear();
        assert_eq!(memory.peek(0), 0);
        assert!(memory.restore_cartridge());
        assert_eq!(memory.peek(0), 7);
    }
}
