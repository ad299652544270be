use nibble_core::console::Console;
use nibble_core::gfx::{ColorTable, FrameCompositor, SCREEN_HEIGHT, SCREEN_WIDTH, SYSTEM_PALETTE};
use nibble_core::machine::Memory;

fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

#[test]
fn zeroed_screen_is_color_zero_everywhere() {
    let compositor = FrameCompositor::new(ColorTable::new(rgb565));
    let memory = Memory::new();
    let mut surface = vec![0xFFFFu16; SCREEN_WIDTH * SCREEN_HEIGHT];

    compositor.compose(&memory, &mut surface, SCREEN_WIDTH).unwrap();

    let (r, g, b) = SYSTEM_PALETTE[0];
    let black = rgb565(r, g, b);
    assert!(surface.iter().all(|&p| p == black));
}

#[test]
fn screen_palette_swap_recolors_whole_frame() {
    let compositor = FrameCompositor::new(ColorTable::new(|r, g, b| u32::from_be_bytes([0xFF, r, g, b])));
    let mut memory = Memory::new();
    memory.screen_data_mut().fill(0x33);
    memory.screen_palette_mut()[3] = 0x80 | 5;

    let mut surface = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
    compositor.compose(&memory, &mut surface, SCREEN_WIDTH).unwrap();

    let expected = compositor.colors().get(16 + 5);
    assert!(surface.iter().all(|&p| p == expected));
}

#[test]
fn padded_surface_keeps_gutter_untouched() {
    const PITCH: usize = SCREEN_WIDTH + 8;
    let compositor = FrameCompositor::new(ColorTable::new(|_, _, _| 1u8));
    let mut console = Console::default();
    let mut surface = vec![0u8; PITCH * SCREEN_HEIGHT];

    console.step_frame(&compositor, &mut surface, PITCH).unwrap();

    for row in surface.chunks(PITCH) {
        assert!(row[..SCREEN_WIDTH].iter().all(|&p| p == 1));
        assert!(row[SCREEN_WIDTH..].iter().all(|&p| p == 0));
    }
}
