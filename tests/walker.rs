//! Control flow discovery through the public API.

use std::{cell::RefCell, rc::Rc};

use z80scope::prelude::*;

fn walk(image: &[u8], load_address: u16) -> DecompileWalker<'_> {
    let mut walker = DecompileWalker::new(image, load_address, load_address).unwrap();
    walker.run().unwrap();
    walker
}

#[test]
fn self_loop() {
    let walker = walk(&[0x18, 0xFE], 0);

    assert_eq!(walker.seen().len(), 1);
    assert!(walker.seen().contains_key(&0));
    assert!(walker.targets().contains(0));
    assert!(walker.targets().get(0).unwrap().is_relative_only());
    assert!(walker.is_finished());
    assert!(walker.failed_decodes().is_empty());
}

#[test]
fn truncated_instruction_is_a_failure() {
    // NOP ; CALL with no address bytes left
    let walker = walk(&[0x00, 0xCD], 0);

    assert_eq!(walker.failed_decodes(), vec![(1, 1)]);
    assert!(walker.targets().is_empty());
    assert!(walker.is_finished());
}

#[test]
fn decoding_is_deterministic() {
    let code = [0xC2, 0x34, 0x12];
    let context = DecodeContext::new(0x1000, 0x100, WalkerOptions::default());

    let mut first_context = context.clone();
    let first = decode_instruction(&mut Parser::new(&code), &mut first_context).unwrap();
    let mut second_context = context.clone();
    let second = decode_instruction(&mut Parser::new(&code), &mut second_context).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_string(), "JP NZ, $1234");
    assert_eq!(first_context.targets(), second_context.targets());
    assert!(context.targets().is_empty());
}

#[test]
fn constants_flow_through_the_stack() {
    // LD SP, $9000 ; LD BC, $1234 ; PUSH BC ; POP DE ; HALT
    let code = [0x31, 0x00, 0x90, 0x01, 0x34, 0x12, 0xC5, 0xD1, 0x76];
    let mut walker = DecompileWalker::new(&code, 0x4000, 0x4000).unwrap();

    for _ in 0..4 {
        walker.decode().unwrap();
    }
    assert_eq!(walker.state().get_compound(Register16::DE), Some(0x1234));
    assert_eq!(walker.state().get_compound(Register16::SP), Some(0x9000));
    assert!(walker.memory_locations().contains(&0x9000));
}

#[test]
fn indirect_jump_through_known_index_register() {
    // LD IX, $4007 ; JP (IX) ; DB ; RET
    let code = [0xDD, 0x21, 0x07, 0x40, 0xDD, 0xE9, 0xFF, 0xC9];
    let walker = walk(&code, 0x4000);

    assert!(walker.seen().contains_key(&7));
    assert!(!walker.seen().contains_key(&6));
    assert_eq!(
        walker.targets().get(0x4007).map(|target| target.kind),
        Some(TargetKind::Jump)
    );
}

#[test]
fn probable_addresses_are_promoted_or_dropped() {
    let code = [
        0x21, 0x08, 0x40, // LD HL, $4008
        0x21, 0x0A, 0x40, // LD HL, $400A
        0x7E, // LD A, (HL)
        0xC9, // RET
        0x00, 0x00, 0x00,
    ];
    let walker = walk(&code, 0x4000);

    assert!(walker.probable_addresses().contains(&0x4008));
    assert!(walker.memory_locations().contains(&0x400A));
    assert!(!walker.probable_addresses().contains(&0x400A));
}

#[test]
fn out_of_range_references() {
    // CALL $0038 ; LD ($C000), A ; JP $0000
    let code = [0xCD, 0x38, 0x00, 0x32, 0x00, 0xC0, 0xC3, 0x00, 0x00];
    let walker = walk(&code, 0x8000);

    let outside = walker.out_of_range_content();
    assert_eq!(outside.functions, vec![0x0038]);
    assert_eq!(outside.jumps, vec![0x0000]);
    assert_eq!(outside.memory_locations, vec![0xC000]);
}

#[test]
fn listeners_see_register_writes() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    // LD A, $07 ; RET
    let code = [0x3E, 0x07, 0xC9];
    let mut walker = DecompileWalker::new(&code, 0, 0).unwrap();
    walker.state_mut().on_register_stored(move |event| {
        sink.borrow_mut().push((event.register, event.value));
    });
    walker.decode().unwrap();

    let events = events.borrow();
    assert_eq!(events[0], (RegisterRef::Atomic(Register8::A), Some(0x07)));
    assert!(events.contains(&(RegisterRef::Compound(Register16::AF), None)));
}

#[test]
fn debug_options_do_not_change_the_walk() {
    let code = [0x3E, 0x01, 0x28, 0x01, 0x00, 0xC9];
    let plain = walk(&code, 0);

    let options = WalkerOptions {
        debug: DebugOptions::JUMP | DebugOptions::STATE,
        ..WalkerOptions::default()
    };
    let mut traced = DecompileWalker::with_options(&code, 0, 0, options).unwrap();
    traced.run().unwrap();

    assert_eq!(plain.seen(), traced.seen());
}

#[test]
fn walks_a_file_image() {
    let path = std::env::temp_dir().join(format!("z80scope-walker-{}.bin", std::process::id()));
    std::fs::write(&path, [0x3E, 0x01, 0xC9]).unwrap();

    {
        let image = Image::from_file(&path).unwrap();
        let walker = walk(image.data(), 0x6000);
        assert_eq!(walker.seen().len(), 2);
    }
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn exchanged_and_popped_pointers_are_classified() {
    // LD DE, $9000 ; EX DE, HL ; RET
    let walker = walk(&[0x11, 0x00, 0x90, 0xEB, 0xC9], 0x8000);
    assert!(walker.probable_addresses().contains(&0x9000));

    // LD SP, $F000 ; LD BC, $9100 ; PUSH BC ; POP HL ; LD BC, $9200 ; PUSH BC ; POP IX ; RET
    let code = [
        0x31, 0x00, 0xF0, 0x01, 0x00, 0x91, 0xC5, 0xE1, 0x01, 0x00, 0x92, 0xC5, 0xDD, 0xE1, 0xC9,
    ];
    let walker = walk(&code, 0x8000);
    assert!(walker.probable_addresses().contains(&0x9100));
    assert!(walker.memory_locations().contains(&0x9200));
    assert!(walker.memory_locations().contains(&0xF000));
}

#[test]
fn prefixed_relative_jump_lands_after_itself() {
    // DD 18 00 ; RET
    let walker = walk(&[0xDD, 0x18, 0x00, 0xC9], 0);

    assert_eq!(walker.seen()[&0].length(), 3);
    assert!(walker.seen().contains_key(&3));
    assert!(walker.targets().contains(3));
    assert!(!walker.targets().contains(2));
    assert!(walker.failed_decodes().is_empty());
}
