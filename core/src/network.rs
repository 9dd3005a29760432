pub mod icmp;
pub mod packet;
pub mod socket;
pub mod tcp;
